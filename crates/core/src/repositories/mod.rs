//! File-backed store implementations.
//!
//! Every record is a JSON document under the data directory, sharded two levels deep by the
//! first four characters of its key:
//!
//! ```text
//! <data_dir>/
//!     mappings/<id[0..2]>/<id[2..4]>/<id>.json
//!     accounts/<s1>/<s2>/<account_ref>/profile.json
//!     credentials/<h[0..2]>/<h[2..4]>/<h>/credential.json   h = sha256(lowercase email)
//!     entries/<s1>/<s2>/<patient_ref>/<entry_id>.json
//!     prescriptions/<s1>/<s2>/<patient_ref>/<record_id>.json
//!     appointments/<s1>/<s2>/<patient_ref>/<record_id>.json
//! ```
//!
//! Records that must be unique (mappings, credentials, new clinical records) are written to a
//! temporary file and hard-linked into place, so the filesystem arbitrates concurrent writers.
//! Documents that are replaced in place (profiles, edited clinical records) are written to a
//! temporary file and renamed over the old one.

mod accounts;
mod credentials;
mod helpers;
mod mappings;
mod records;

pub use accounts::FileAccountStore;
pub use credentials::FileAuthenticator;
pub use mappings::FileMappingStore;
pub use records::FileRecordStore;
