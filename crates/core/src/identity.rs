//! Registration, login and patient lookup.
//!
//! [`IdentityService`] is the interface the API layers and the CLI talk to. It owns no state of
//! its own: everything lives in the stores handed to it in [`Stores`], and one service instance
//! is shared by every request handler.
//!
//! Patient registration touches three stores and is not atomic across them. The order is:
//!
//! 1. reject a national ID that is already registered,
//! 2. allocate an identifier,
//! 3. create the authenticator account,
//! 4. write the mapping (atomic create; one re-allocation if another registration won the
//!    identifier in between),
//! 5. write the profile.
//!
//! If step 4 or 5 fails the authenticator account is deleted again. A mapping written in step
//! 4 is immutable and stays behind when step 5 fails; it points at an account that no longer
//! exists and is logged as orphaned.
//!
//! Logging in opens a session with the authenticator, whichever second factor was used.
//! Profile edits and the doctor's patient search require an open session.

use crate::account::{
    Account, AccountField, AccountStore, AccountSummary, DoctorProfile, PatientProfile, Profile,
    Role,
};
use crate::allocator::{IdentifierAllocator, SuffixSource};
use crate::auth::Authenticator;
use crate::config::CoreConfig;
use crate::care::{Appointment, Prescription};
use crate::entries::{DailyEntry, DailyEntryService};
use crate::mapping::{IdentifierMapping, MappingStore};
use crate::memory::{
    InMemoryAccountStore, InMemoryAuthenticator, InMemoryMappingStore, InMemoryRecordStore,
};
use crate::records::RecordStore;
use crate::repositories::{FileAccountStore, FileAuthenticator, FileMappingStore, FileRecordStore};
use crate::resolver::{CredentialResolver, Resolution};
use crate::{IdentityError, IdentityResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use thejas_types::{EmailAddress, NationalId, NonEmptyText, Password, PatientIdentifier};
use thejas_uuid::AccountRef;

/// The store backends an [`IdentityService`] runs on.
#[derive(Clone)]
pub struct Stores {
    pub mappings: Arc<dyn MappingStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub authenticator: Arc<dyn Authenticator>,
    pub entries: Arc<dyn RecordStore<DailyEntry>>,
    pub prescriptions: Arc<dyn RecordStore<Prescription>>,
    pub appointments: Arc<dyn RecordStore<Appointment>>,
}

impl Stores {
    /// JSON files under the configured data directory.
    pub fn file_backed(cfg: &CoreConfig) -> Self {
        Self {
            mappings: Arc::new(FileMappingStore::new(cfg.mappings_dir())),
            accounts: Arc::new(FileAccountStore::new(cfg.accounts_dir())),
            authenticator: Arc::new(FileAuthenticator::new(cfg.credentials_dir())),
            entries: Arc::new(FileRecordStore::new(cfg.entries_dir())),
            prescriptions: Arc::new(FileRecordStore::new(cfg.prescriptions_dir())),
            appointments: Arc::new(FileRecordStore::new(cfg.appointments_dir())),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            mappings: Arc::new(InMemoryMappingStore::new()),
            accounts: Arc::new(InMemoryAccountStore::new()),
            authenticator: Arc::new(InMemoryAuthenticator::new()),
            entries: Arc::new(InMemoryRecordStore::new()),
            prescriptions: Arc::new(InMemoryRecordStore::new()),
            appointments: Arc::new(InMemoryRecordStore::new()),
        }
    }
}

#[derive(Debug)]
pub struct PatientRegistration {
    pub display_name: NonEmptyText,
    pub national_id: NationalId,
    pub email: EmailAddress,
    pub password: Password,
    pub phone: Option<NonEmptyText>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<NonEmptyText>,
}

#[derive(Debug)]
pub struct DoctorRegistration {
    pub display_name: NonEmptyText,
    pub national_id: NationalId,
    pub email: EmailAddress,
    pub password: Password,
    pub licence_id: NonEmptyText,
    pub phone: Option<NonEmptyText>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisteredPatient {
    pub account_ref: AccountRef,
    pub identifier: PatientIdentifier,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisteredDoctor {
    pub account_ref: AccountRef,
}

/// The second login factor.
#[derive(Debug)]
pub enum Secondary {
    Password(Password),
    /// Patients only, and only together with a patient identifier.
    NationalId(NationalId),
}

#[derive(Debug)]
pub struct LoginRequest {
    pub role: Role,
    /// Email, patient identifier, doctor phone number or medical licence ID.
    pub login_input: String,
    pub secondary: Secondary,
}

/// Patient-editable profile fields. `None` leaves a field unchanged.
///
/// Email, national ID and identifier are fixed at registration.
#[derive(Debug, Default)]
pub struct PatientProfileUpdate {
    pub display_name: Option<NonEmptyText>,
    pub phone: Option<NonEmptyText>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<NonEmptyText>,
}

/// What a doctor sees after looking a patient up by identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatientRecord {
    pub account_ref: AccountRef,
    pub identifier: PatientIdentifier,
    pub display_name: NonEmptyText,
    pub email: EmailAddress,
    pub phone: Option<NonEmptyText>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<NonEmptyText>,
    pub last_visit: Option<NaiveDate>,
    pub registered_at: DateTime<Utc>,
}

impl PatientRecord {
    /// `None` for doctor accounts.
    pub fn from_account(account: Account) -> Option<Self> {
        match account.profile {
            Profile::Patient(profile) => Some(Self {
                account_ref: account.account_ref,
                identifier: profile.identifier,
                display_name: account.display_name,
                email: account.email,
                phone: profile.phone,
                date_of_birth: profile.date_of_birth,
                gender: profile.gender,
                last_visit: profile.last_visit,
                registered_at: account.created_at,
            }),
            Profile::Doctor(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct IdentityService {
    cfg: Arc<CoreConfig>,
    mappings: Arc<dyn MappingStore>,
    accounts: Arc<dyn AccountStore>,
    authenticator: Arc<dyn Authenticator>,
    allocator: IdentifierAllocator,
    resolver: CredentialResolver,
    entries: DailyEntryService,
}

impl IdentityService {
    pub fn new(cfg: Arc<CoreConfig>, stores: Stores, suffixes: Arc<dyn SuffixSource>) -> Self {
        let allocator =
            IdentifierAllocator::new(stores.mappings.clone(), suffixes, cfg.allocation_attempts());
        let resolver = CredentialResolver::new(stores.mappings.clone(), stores.accounts.clone());
        let entries = DailyEntryService::new(&stores);

        Self {
            cfg,
            mappings: stores.mappings,
            accounts: stores.accounts,
            authenticator: stores.authenticator,
            allocator,
            resolver,
            entries,
        }
    }

    pub fn entries(&self) -> &DailyEntryService {
        &self.entries
    }

    /// Registers a patient and mints their identifier.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::NationalIdAlreadyRegistered`] before anything is written.
    /// - [`IdentityError::AllocationExhausted`] before anything is written.
    /// - [`IdentityError::EmailInUse`] from the authenticator.
    /// - [`IdentityError::AlreadyExists`] if the identifier race was lost more often than the
    ///   configured retries allow.
    /// - [`IdentityError::RegistrationRollbackFailed`] if a later step failed and deleting the
    ///   authenticator account failed as well.
    pub fn register_patient(&self, reg: PatientRegistration) -> IdentityResult<RegisteredPatient> {
        if self.national_id_registered(&reg.national_id)? {
            return Err(IdentityError::NationalIdAlreadyRegistered);
        }

        let identifier = self.allocator.allocate(&reg.national_id)?;
        let account_ref = self.authenticator.create_account(&reg.email, &reg.password)?;

        let identifier = match self.write_mapping(identifier, &account_ref, &reg) {
            Ok(identifier) => identifier,
            Err(e) => return Err(self.roll_back(&account_ref, e)),
        };

        let now = Utc::now();
        let account = Account {
            account_ref: account_ref.clone(),
            display_name: reg.display_name,
            national_id: reg.national_id,
            email: reg.email,
            profile: Profile::Patient(PatientProfile {
                identifier: identifier.clone(),
                phone: reg.phone,
                date_of_birth: reg.date_of_birth,
                gender: reg.gender,
                last_visit: None,
            }),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.accounts.put(&account) {
            tracing::warn!(identifier = %identifier, "profile write failed, mapping left orphaned");
            return Err(self.roll_back(&account_ref, e));
        }

        tracing::info!(identifier = %identifier, account = %account_ref, "patient registered");
        Ok(RegisteredPatient {
            account_ref,
            identifier,
        })
    }

    /// Registers a doctor. Doctors get no patient identifier.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::NationalIdAlreadyRegistered`] or
    ///   [`IdentityError::LicenceAlreadyRegistered`] before anything is written.
    /// - [`IdentityError::EmailInUse`] from the authenticator.
    /// - [`IdentityError::RegistrationRollbackFailed`] as for patients.
    pub fn register_doctor(&self, reg: DoctorRegistration) -> IdentityResult<RegisteredDoctor> {
        if self.is_registered(Role::Doctor, AccountField::NationalId, reg.national_id.as_str())? {
            return Err(IdentityError::NationalIdAlreadyRegistered);
        }
        if self.is_registered(Role::Doctor, AccountField::LicenceId, reg.licence_id.as_str())? {
            return Err(IdentityError::LicenceAlreadyRegistered);
        }

        let account_ref = self.authenticator.create_account(&reg.email, &reg.password)?;

        let now = Utc::now();
        let account = Account {
            account_ref: account_ref.clone(),
            display_name: reg.display_name,
            national_id: reg.national_id,
            email: reg.email,
            profile: Profile::Doctor(DoctorProfile {
                licence_id: reg.licence_id,
                phone: reg.phone,
                date_of_birth: reg.date_of_birth,
            }),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.accounts.put(&account) {
            return Err(self.roll_back(&account_ref, e));
        }

        tracing::info!(account = %account_ref, "doctor registered");
        Ok(RegisteredDoctor { account_ref })
    }

    /// Authenticates a patient or doctor and returns their account summary.
    ///
    /// Every credential failure (unknown identifier, wrong national ID, wrong password, an
    /// account of the other role) carries the same user message.
    pub fn login(&self, req: LoginRequest) -> IdentityResult<AccountSummary> {
        let account_ref = self.authenticate(&req)?;

        let account = self
            .accounts
            .get(&account_ref)?
            .ok_or_else(|| IdentityError::ProfileNotFound(account_ref.to_string()))?;

        if account.role() != req.role {
            tracing::info!(
                account = %account_ref,
                role = %req.role,
                "login rejected for account of another role"
            );
            self.authenticator.sign_out(&account_ref)?;
            return Err(IdentityError::AuthenticationFailed);
        }

        tracing::info!(account = %account_ref, role = %req.role, "login succeeded");
        Ok(account.summary())
    }

    pub fn logout(&self, account_ref: &AccountRef) -> IdentityResult<()> {
        self.authenticator.sign_out(account_ref)
    }

    /// Looks a patient up by identifier, typed in or scanned from their card.
    ///
    /// # Errors
    ///
    /// [`IdentityError::ProfileNotFound`] if the identifier is unknown or its profile is
    /// missing.
    pub fn find_patient(&self, identifier: &PatientIdentifier) -> IdentityResult<PatientRecord> {
        let not_found = || IdentityError::ProfileNotFound(identifier.to_string());

        let mapping = self.mappings.lookup(identifier)?.ok_or_else(not_found)?;
        let account = self.accounts.get(&mapping.account_ref)?.ok_or_else(not_found)?;

        PatientRecord::from_account(account).ok_or_else(not_found)
    }

    /// Applies a patient's own profile edit.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::ProfileNotFound`] if the account is unknown.
    /// - [`IdentityError::Validation`] if the account is a doctor's.
    /// - [`IdentityError::AuthenticationFailed`] if the patient is not signed in.
    pub fn update_patient_profile(
        &self,
        account_ref: &AccountRef,
        update: PatientProfileUpdate,
    ) -> IdentityResult<PatientRecord> {
        let mut account = self
            .accounts
            .get(account_ref)?
            .ok_or_else(|| IdentityError::ProfileNotFound(account_ref.to_string()))?;
        let Profile::Patient(profile) = &mut account.profile else {
            return Err(IdentityError::Validation(
                "only patients can edit a patient profile".into(),
            ));
        };
        if !self.authenticator.is_signed_in(account_ref)? {
            tracing::info!(account = %account_ref, "profile update rejected without a session");
            return Err(IdentityError::AuthenticationFailed);
        }

        if let Some(phone) = update.phone {
            profile.phone = Some(phone);
        }
        if let Some(date_of_birth) = update.date_of_birth {
            profile.date_of_birth = Some(date_of_birth);
        }
        if let Some(gender) = update.gender {
            profile.gender = Some(gender);
        }
        if let Some(display_name) = update.display_name {
            account.display_name = display_name;
        }
        account.updated_at = Utc::now();
        self.accounts.put(&account)?;

        tracing::info!(account = %account_ref, "patient profile updated");
        PatientRecord::from_account(account)
            .ok_or_else(|| IdentityError::ProfileNotFound(account_ref.to_string()))
    }

    /// Patients matching `term` by name, identifier, phone or email, oldest registration
    /// first. Only a signed-in doctor may search.
    ///
    /// # Errors
    ///
    /// [`IdentityError::Validation`] for a blank term or a non-doctor caller, and
    /// [`IdentityError::AuthenticationFailed`] if the doctor is not signed in.
    pub fn search_patients(
        &self,
        doctor_ref: &AccountRef,
        term: &str,
    ) -> IdentityResult<Vec<PatientRecord>> {
        if term.trim().is_empty() {
            return Err(IdentityError::Validation("search term is empty".into()));
        }
        self.entries.signed_in_doctor(doctor_ref)?;

        let mut found: Vec<PatientRecord> = self
            .accounts
            .list(Role::Patient)?
            .into_iter()
            .filter(|account| account.matches_search(term))
            .filter_map(PatientRecord::from_account)
            .collect();
        found.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));

        tracing::debug!(account = %doctor_ref, results = found.len(), "patient search");
        Ok(found)
    }

    /// True if a patient with this national ID exists.
    pub fn national_id_registered(&self, national_id: &NationalId) -> IdentityResult<bool> {
        self.is_registered(Role::Patient, AccountField::NationalId, national_id.as_str())
    }

    fn is_registered(&self, role: Role, field: AccountField, value: &str) -> IdentityResult<bool> {
        Ok(!self.accounts.find_by(role, field, value)?.is_empty())
    }

    /// Writes the mapping for `identifier`, re-allocating when another registration created
    /// the same identifier first. Returns the identifier actually written.
    fn write_mapping(
        &self,
        mut identifier: PatientIdentifier,
        account_ref: &AccountRef,
        reg: &PatientRegistration,
    ) -> IdentityResult<PatientIdentifier> {
        let mut retries_left = self.cfg.race_retries();

        loop {
            let mapping = IdentifierMapping::new(
                identifier.clone(),
                account_ref.clone(),
                reg.national_id.clone(),
                reg.email.clone(),
                reg.display_name.clone(),
            );

            match self.mappings.create(&mapping) {
                Ok(()) => return Ok(identifier),
                Err(IdentityError::AlreadyExists(taken)) if retries_left > 0 => {
                    retries_left -= 1;
                    tracing::warn!(identifier = %taken, "identifier taken at create, re-allocating");
                    identifier = self.allocator.allocate(&reg.national_id)?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Deletes the authenticator account of a registration that failed with `cause`.
    fn roll_back(&self, account_ref: &AccountRef, cause: IdentityError) -> IdentityError {
        tracing::warn!(
            account = %account_ref,
            error = %cause,
            "registration failed, deleting authenticator account"
        );

        match self.authenticator.delete_account(account_ref) {
            Ok(()) => cause,
            Err(rollback_error) => {
                tracing::error!(
                    account = %account_ref,
                    error = %rollback_error,
                    "failed to delete authenticator account after registration failure"
                );
                IdentityError::RegistrationRollbackFailed {
                    account: account_ref.to_string(),
                    registration_error: Box::new(cause),
                    rollback_error: Box::new(rollback_error),
                }
            }
        }
    }

    fn authenticate(&self, req: &LoginRequest) -> IdentityResult<AccountRef> {
        match (req.role, &req.secondary) {
            (Role::Patient, Secondary::Password(password)) => {
                match self.resolver.resolve(&req.login_input, None)? {
                    Resolution::Email {
                        email,
                        expected_account,
                    } => self.sign_in(&email, password, expected_account.as_ref()),
                    Resolution::Account(_) => Err(IdentityError::AuthenticationFailed),
                }
            }
            (Role::Patient, Secondary::NationalId(national_id)) => {
                match self.resolver.resolve(&req.login_input, Some(national_id))? {
                    Resolution::Account(account_ref) => {
                        self.authenticator.open_session(&account_ref)?;
                        Ok(account_ref)
                    }
                    Resolution::Email { .. } => Err(IdentityError::AuthenticationFailed),
                }
            }
            (Role::Doctor, Secondary::Password(password)) => {
                let email = self.resolver.resolve_doctor(&req.login_input)?;
                self.sign_in(&email, password, None)
            }
            (Role::Doctor, Secondary::NationalId(_)) => Err(IdentityError::Validation(
                "doctors sign in with a password".into(),
            )),
        }
    }

    fn sign_in(
        &self,
        email: &EmailAddress,
        password: &Password,
        expected: Option<&AccountRef>,
    ) -> IdentityResult<AccountRef> {
        let actual = self.authenticator.sign_in(email, password)?;

        match expected {
            Some(expected) if *expected != actual => {
                tracing::error!(
                    expected = %expected,
                    actual = %actual,
                    "identifier mapping points at a different account than the authenticator"
                );
                self.authenticator.sign_out(&actual)?;
                Err(IdentityError::AccountMismatch {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                })
            }
            _ => Ok(actual),
        }
    }
}
