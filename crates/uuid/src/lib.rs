//! Account references and entry identifiers.
//!
//! Every account issued by the authenticator is identified by an [`AccountRef`]: a UUID kept in
//! *canonical* form, **32 lowercase hexadecimal characters** (no hyphens). Canonical form is
//! required for anything arriving from outside the core (CLI arguments, API requests); other
//! spellings (uppercase, hyphenated) are rejected rather than normalised.
//!
//! ## Sharded directory layout
//! For a canonical reference `u`, the file-backed stores keep per-account data under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `thejas_data/accounts/55/0e/550e8400e29b41d4a716446655440000/`
//!
//! Daily clinical entries are keyed by an [`EntryId`], a timestamp-prefixed UUID that sorts
//! chronologically and is monotonic per patient.

mod service;

pub use service::{AccountRef, EntryId, Uuid};

/// Error type for identifier parsing.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
