//! Per-patient clinical records.
//!
//! Daily entries, prescriptions and appointments are all documents that belong to one patient
//! and are keyed by a time-prefixed [`EntryId`]. They share one store abstraction: a
//! [`RecordStore`] hands out ids strictly later than the patient's previous record, so a
//! patient's records sort in creation order by id alone.

use crate::IdentityResult;
use serde::{de::DeserializeOwned, Serialize};
use thejas_uuid::{AccountRef, EntryId};

/// A document stored per patient under a time-prefixed id.
pub trait StoredRecord: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn record_id(&self) -> &EntryId;

    /// The patient the record belongs to.
    fn owner(&self) -> &AccountRef;
}

/// Builds a record once its id is known.
pub type RecordBuilder<'a, T> = Box<dyn FnOnce(EntryId) -> T + Send + 'a>;

pub trait RecordStore<T: StoredRecord>: Send + Sync {
    /// Generates an id strictly later than the patient's newest record, builds the record with
    /// it and persists it. Id generation and the write happen under one lock.
    fn append(&self, patient_ref: &AccountRef, build: RecordBuilder<'_, T>) -> IdentityResult<T>;

    /// Replaces a stored record.
    ///
    /// # Errors
    ///
    /// [`IdentityError::RecordNotFound`](crate::IdentityError::RecordNotFound) if no record
    /// with this id exists for its patient.
    fn update(&self, record: &T) -> IdentityResult<()>;

    fn get(&self, patient_ref: &AccountRef, record_id: &EntryId) -> IdentityResult<Option<T>>;

    /// Every record of the patient, in no particular order.
    fn list(&self, patient_ref: &AccountRef) -> IdentityResult<Vec<T>>;
}
