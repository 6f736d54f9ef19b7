//! The identifier mapping index.
//!
//! A mapping links a public [`PatientIdentifier`] to the account behind it, duplicating the
//! national ID and email so that identifier logins need a single point read.
//!
//! The store is also the uniqueness oracle for the allocator. `exists` is only a pre-check:
//! the guarantee that two accounts never share an identifier comes from `create`, which every
//! backend must implement as an atomic create-if-absent.

use crate::IdentityResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thejas_types::{EmailAddress, NationalId, NonEmptyText, PatientIdentifier};
use thejas_uuid::AccountRef;

/// Immutable link from an identifier to an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierMapping {
    pub identifier: PatientIdentifier,
    pub account_ref: AccountRef,
    pub national_id: NationalId,
    pub email: EmailAddress,
    pub display_name: NonEmptyText,
    pub created_at: DateTime<Utc>,
}

impl IdentifierMapping {
    /// Builds a mapping stamped with the current time.
    pub fn new(
        identifier: PatientIdentifier,
        account_ref: AccountRef,
        national_id: NationalId,
        email: EmailAddress,
        display_name: NonEmptyText,
    ) -> Self {
        Self {
            identifier,
            account_ref,
            national_id,
            email,
            display_name,
            created_at: Utc::now(),
        }
    }
}

pub trait MappingStore: Send + Sync {
    /// True iff a mapping with this identifier has been durably written.
    fn exists(&self, identifier: &PatientIdentifier) -> IdentityResult<bool>;

    /// Writes `mapping` if its identifier is free.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::AlreadyExists`](crate::IdentityError::AlreadyExists) if the key is
    ///   taken; the existing record is left untouched.
    /// - [`IdentityError::StorageUnavailable`](crate::IdentityError::StorageUnavailable) on
    ///   backend failures.
    fn create(&self, mapping: &IdentifierMapping) -> IdentityResult<()>;

    /// Point read by identifier. Absence is `Ok(None)`, not an error.
    fn lookup(&self, identifier: &PatientIdentifier) -> IdentityResult<Option<IdentifierMapping>>;
}
