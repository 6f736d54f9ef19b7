//! # Thejas Core
//!
//! Identity and daily-record logic for the Thejas patient/doctor portal.
//!
//! This crate contains:
//! - patient identifier allocation with collision retry ([`allocator`]),
//! - the identifier mapping index ([`mapping`]),
//! - credential resolution for patient and doctor logins ([`resolver`]),
//! - registration, login, profile edits and patient search built on those ([`identity`]),
//! - doctor-authored daily clinical entries ([`entries`]),
//! - prescriptions and appointments ([`care`]),
//! - the per-patient record store abstraction they share ([`records`]),
//! - file-backed and in-memory store backends ([`repositories`], [`memory`]).
//!
//! **No API concerns**: HTTP/gRPC servers, API keys and wire types belong in `api-grpc`,
//! `api-rest`, or `api-shared`.

pub mod account;
pub mod allocator;
pub mod auth;
pub mod care;
pub mod config;
pub mod constants;
pub mod entries;
pub mod error;
pub mod identity;
pub mod mapping;
pub mod memory;
pub mod records;
pub mod repositories;
pub mod resolver;

pub use account::{Account, AccountField, AccountStore, AccountSummary, Role};
pub use allocator::{IdentifierAllocator, RandomSuffix, SuffixSource};
pub use auth::Authenticator;
pub use care::{
    Appointment, AppointmentDetails, AppointmentStatus, Prescription, PrescriptionDetails,
    PrescriptionStatus,
};
pub use config::{data_dir_from_env_value, CoreConfig};
pub use entries::{DailyEntry, DailyEntryService, EntryDetails, Vitals};
pub use error::{ErrorKind, IdentityError, IdentityResult};
pub use identity::{
    DoctorRegistration, IdentityService, LoginRequest, PatientProfileUpdate, PatientRecord,
    PatientRegistration, RegisteredDoctor, RegisteredPatient, Secondary, Stores,
};
pub use mapping::{IdentifierMapping, MappingStore};
pub use records::{RecordStore, StoredRecord};
pub use resolver::{CredentialResolver, Resolution};

pub use thejas_types::{
    EmailAddress, NationalId, NonEmptyText, Password, PatientIdentifier, TextError,
};
pub use thejas_uuid::{AccountRef, EntryId};
