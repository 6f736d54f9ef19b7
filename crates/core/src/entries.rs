//! Daily clinical entries.
//!
//! A doctor records one entry per patient visit from the dashboard. Each entry is keyed by a
//! time-prefixed [`EntryId`] generated under the store's lock, so ids of one patient sort in
//! creation order. The doctor who recorded an entry may later correct it.
//!
//! Every write requires the doctor to hold an open session with the authenticator.
//!
//! Adding or correcting an entry also moves the patient's `last_visit` forward. That profile
//! update is secondary: if it fails the entry is still reported as saved and the failure is
//! logged.

use crate::account::{Account, AccountStore, Profile, Role};
use crate::auth::Authenticator;
use crate::care::{Appointment, Prescription};
use crate::identity::Stores;
use crate::mapping::MappingStore;
use crate::records::{RecordStore, StoredRecord};
use crate::{IdentityError, IdentityResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thejas_types::{NonEmptyText, PatientIdentifier};
use thejas_uuid::{AccountRef, EntryId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Completed,
}

/// Vital signs, kept as the doctor typed them (`"120/80"`, `"98.6"`, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
}

/// The clinical content of an entry, as entered on the dashboard form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDetails {
    pub visit_date: NaiveDate,
    pub symptoms: NonEmptyText,
    pub diagnosis: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests_recommended: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_visit: Option<NaiveDate>,
    #[serde(default)]
    pub vitals: Vitals,
}

impl EntryDetails {
    fn validate(&self) -> IdentityResult<()> {
        check_next_visit(self.visit_date, self.next_visit)
    }
}

pub(crate) fn check_next_visit(date: NaiveDate, next_visit: Option<NaiveDate>) -> IdentityResult<()> {
    match next_visit {
        Some(next) if next < date => Err(IdentityError::Validation(
            "next visit date is before the visit date".into(),
        )),
        _ => Ok(()),
    }
}

/// An entry that has not been given an id yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryDraft {
    pub patient_ref: AccountRef,
    pub patient_identifier: PatientIdentifier,
    pub patient_name: NonEmptyText,
    pub doctor_ref: AccountRef,
    pub doctor_name: NonEmptyText,
    pub details: EntryDetails,
}

impl EntryDraft {
    /// Stamps the draft with `entry_id`. Creation time is taken from the id.
    pub fn into_entry(self, entry_id: EntryId) -> DailyEntry {
        let created_at = entry_id.timestamp();
        DailyEntry {
            entry_id,
            patient_ref: self.patient_ref,
            patient_identifier: self.patient_identifier,
            patient_name: self.patient_name,
            doctor_ref: self.doctor_ref,
            doctor_name: self.doctor_name,
            details: self.details,
            status: EntryStatus::Completed,
            created_at,
            updated_at: created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub entry_id: EntryId,
    pub patient_ref: AccountRef,
    pub patient_identifier: PatientIdentifier,
    pub patient_name: NonEmptyText,
    pub doctor_ref: AccountRef,
    pub doctor_name: NonEmptyText,
    #[serde(flatten)]
    pub details: EntryDetails,
    #[serde(default)]
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord for DailyEntry {
    fn record_id(&self) -> &EntryId {
        &self.entry_id
    }

    fn owner(&self) -> &AccountRef {
        &self.patient_ref
    }
}

/// Doctor-dashboard operations on a patient's clinical records.
///
/// Prescriptions and appointments live in [`care`](crate::care); this type owns the shared
/// lookups and the session check.
#[derive(Clone)]
pub struct DailyEntryService {
    mappings: Arc<dyn MappingStore>,
    accounts: Arc<dyn AccountStore>,
    authenticator: Arc<dyn Authenticator>,
    entries: Arc<dyn RecordStore<DailyEntry>>,
    pub(crate) prescriptions: Arc<dyn RecordStore<Prescription>>,
    pub(crate) appointments: Arc<dyn RecordStore<Appointment>>,
}

impl DailyEntryService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            mappings: stores.mappings.clone(),
            accounts: stores.accounts.clone(),
            authenticator: stores.authenticator.clone(),
            entries: stores.entries.clone(),
            prescriptions: stores.prescriptions.clone(),
            appointments: stores.appointments.clone(),
        }
    }

    /// Records a visit of the patient behind `identifier`, authored by `doctor_ref`.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::ProfileNotFound`] if the identifier or the doctor is unknown.
    /// - [`IdentityError::Validation`] if `doctor_ref` is not a doctor, or the next visit date
    ///   precedes the visit date.
    /// - [`IdentityError::AuthenticationFailed`] if the doctor is not signed in.
    /// - Store errors from persisting the entry.
    pub fn add_entry(
        &self,
        identifier: &PatientIdentifier,
        doctor_ref: &AccountRef,
        details: EntryDetails,
    ) -> IdentityResult<DailyEntry> {
        details.validate()?;

        let doctor = self.signed_in_doctor(doctor_ref)?;
        let patient = self.patient_account(identifier)?;
        let visit_date = details.visit_date;

        let draft = EntryDraft {
            patient_ref: patient.account_ref.clone(),
            patient_identifier: identifier.clone(),
            patient_name: patient.display_name.clone(),
            doctor_ref: doctor.account_ref.clone(),
            doctor_name: doctor.display_name.clone(),
            details,
        };
        let entry = self
            .entries
            .append(&patient.account_ref, Box::new(move |id| draft.into_entry(id)))?;

        tracing::info!(
            entry_id = %entry.entry_id,
            identifier = %identifier,
            "daily entry added"
        );

        self.record_visit_logged(identifier, patient, visit_date);
        Ok(entry)
    }

    /// Replaces the clinical content of an existing entry.
    ///
    /// Only the doctor who recorded the entry may correct it. The entry keeps its id, author
    /// and creation time.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::RecordNotFound`] if the patient has no entry `entry_id`.
    /// - [`IdentityError::Validation`] if `doctor_ref` did not author the entry, or the new
    ///   details are inconsistent.
    /// - [`IdentityError::AuthenticationFailed`] if the doctor is not signed in.
    pub fn update_entry(
        &self,
        identifier: &PatientIdentifier,
        entry_id: &EntryId,
        doctor_ref: &AccountRef,
        details: EntryDetails,
    ) -> IdentityResult<DailyEntry> {
        details.validate()?;

        let doctor = self.signed_in_doctor(doctor_ref)?;
        let patient = self.patient_account(identifier)?;
        let mut entry = self
            .entries
            .get(&patient.account_ref, entry_id)?
            .ok_or_else(|| IdentityError::RecordNotFound(entry_id.to_string()))?;
        if entry.doctor_ref != doctor.account_ref {
            return Err(IdentityError::Validation(
                "only the doctor who recorded an entry can change it".into(),
            ));
        }

        let visit_date = details.visit_date;
        entry.details = details;
        entry.updated_at = Utc::now();
        self.entries.update(&entry)?;

        tracing::info!(entry_id = %entry.entry_id, identifier = %identifier, "daily entry updated");

        self.record_visit_logged(identifier, patient, visit_date);
        Ok(entry)
    }

    /// All entries of the patient, newest visit first. Entries sharing a visit date are
    /// ordered newest first by creation.
    pub fn entries_for(&self, identifier: &PatientIdentifier) -> IdentityResult<Vec<DailyEntry>> {
        let patient_ref = self.patient_ref(identifier)?;
        let mut entries = self.entries.list(&patient_ref)?;
        entries.sort_by(|a, b| {
            b.details
                .visit_date
                .cmp(&a.details.visit_date)
                .then_with(|| b.entry_id.timestamp().cmp(&a.entry_id.timestamp()))
        });
        Ok(entries)
    }

    /// The most recent entry recorded for `visit_date`, if any.
    pub fn entry_for_date(
        &self,
        identifier: &PatientIdentifier,
        visit_date: NaiveDate,
    ) -> IdentityResult<Option<DailyEntry>> {
        Ok(self
            .entries_for(identifier)?
            .into_iter()
            .find(|e| e.details.visit_date == visit_date))
    }

    /// The doctor behind `doctor_ref`, provided they hold an open session.
    ///
    /// Role is checked before the session so a patient reference reads as invalid input
    /// rather than as a failed sign-in.
    pub(crate) fn signed_in_doctor(&self, doctor_ref: &AccountRef) -> IdentityResult<Account> {
        let doctor = self
            .accounts
            .get(doctor_ref)?
            .ok_or_else(|| IdentityError::ProfileNotFound(doctor_ref.to_string()))?;
        if doctor.role() != Role::Doctor {
            return Err(IdentityError::Validation(
                "only doctors can write clinical records".into(),
            ));
        }
        if !self.authenticator.is_signed_in(doctor_ref)? {
            tracing::info!(account = %doctor_ref, "clinical write rejected without a session");
            return Err(IdentityError::AuthenticationFailed);
        }
        Ok(doctor)
    }

    pub(crate) fn patient_ref(&self, identifier: &PatientIdentifier) -> IdentityResult<AccountRef> {
        self.mappings
            .lookup(identifier)?
            .map(|m| m.account_ref)
            .ok_or_else(|| IdentityError::ProfileNotFound(identifier.to_string()))
    }

    pub(crate) fn patient_account(&self, identifier: &PatientIdentifier) -> IdentityResult<Account> {
        let patient_ref = self.patient_ref(identifier)?;
        self.accounts
            .get(&patient_ref)?
            .ok_or_else(|| IdentityError::ProfileNotFound(identifier.to_string()))
    }

    fn record_visit_logged(
        &self,
        identifier: &PatientIdentifier,
        patient: Account,
        visit_date: NaiveDate,
    ) {
        if let Err(e) = self.record_visit(patient, visit_date) {
            tracing::warn!(
                identifier = %identifier,
                error = %e,
                "failed to update patient last visit"
            );
        }
    }

    fn record_visit(&self, mut patient: Account, visit_date: NaiveDate) -> IdentityResult<()> {
        if let Profile::Patient(profile) = &mut patient.profile {
            if profile.last_visit.is_some_and(|last| last >= visit_date) {
                return Ok(());
            }
            profile.last_visit = Some(visit_date);
            patient.updated_at = Utc::now();
            self.accounts.put(&patient)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::account::fixtures::{doctor, patient};
    use crate::mapping::IdentifierMapping;
    use crate::memory::{InMemoryAccountStore, InMemoryAuthenticator, InMemoryMappingStore};

    pub(crate) fn details(visit_date: NaiveDate, diagnosis: &str) -> EntryDetails {
        EntryDetails {
            visit_date,
            symptoms: NonEmptyText::new("Fever for two days").unwrap(),
            diagnosis: NonEmptyText::new(diagnosis).unwrap(),
            prescription: Some("Paracetamol 500mg".into()),
            tests_recommended: None,
            notes: None,
            next_visit: None,
            vitals: Vitals {
                blood_pressure: Some("120/80".into()),
                temperature: Some("101.2".into()),
                ..Vitals::default()
            },
        }
    }

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn identifier() -> PatientIdentifier {
        PatientIdentifier::parse("3456781234").unwrap()
    }

    /// One mapped patient and one doctor with an open session.
    pub(crate) struct Setup {
        pub(crate) accounts: Arc<InMemoryAccountStore>,
        pub(crate) auth: Arc<InMemoryAuthenticator>,
        pub(crate) service: DailyEntryService,
        pub(crate) patient: Account,
        pub(crate) doctor: Account,
    }

    pub(crate) fn setup_with(
        accounts_store: Arc<dyn AccountStore>,
        accounts: Arc<InMemoryAccountStore>,
    ) -> Setup {
        let mappings = Arc::new(InMemoryMappingStore::new());
        let auth = Arc::new(InMemoryAuthenticator::new());
        let patient = patient("3456781234", "490012345678", "asha@example.com");
        let doctor = doctor("MCI-1234", "9000000001", "meera@example.com");
        accounts.put(&patient).unwrap();
        accounts.put(&doctor).unwrap();
        mappings
            .create(&IdentifierMapping::new(
                identifier(),
                patient.account_ref.clone(),
                patient.national_id.clone(),
                patient.email.clone(),
                patient.display_name.clone(),
            ))
            .unwrap();
        auth.open_session(&doctor.account_ref).unwrap();

        let service = DailyEntryService::new(&Stores {
            mappings,
            accounts: accounts_store,
            authenticator: auth.clone(),
            ..Stores::in_memory()
        });
        Setup {
            accounts,
            auth,
            service,
            patient,
            doctor,
        }
    }

    pub(crate) fn setup() -> Setup {
        let accounts = Arc::new(InMemoryAccountStore::new());
        setup_with(accounts.clone(), accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{date, details, identifier, setup, setup_with};
    use super::*;
    use crate::account::AccountField;
    use crate::memory::InMemoryAccountStore;
    use crate::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn last_visit(accounts: &InMemoryAccountStore, account_ref: &AccountRef) -> Option<NaiveDate> {
        match accounts.get(account_ref).unwrap().unwrap().profile {
            Profile::Patient(p) => p.last_visit,
            Profile::Doctor(_) => None,
        }
    }

    #[test]
    fn test_add_entry_stores_entry_and_updates_last_visit() {
        let s = setup();

        let entry = s
            .service
            .add_entry(&identifier(), &s.doctor.account_ref, details(date(2025, 3, 2), "Viral fever"))
            .expect("add_entry should succeed");

        assert_eq!(entry.patient_ref, s.patient.account_ref);
        assert_eq!(entry.doctor_name.as_str(), "Dr Meera Iyer");
        assert_eq!(entry.status, EntryStatus::Completed);
        assert_eq!(entry.created_at, entry.entry_id.timestamp());
        assert_eq!(
            last_visit(&s.accounts, &s.patient.account_ref),
            Some(date(2025, 3, 2))
        );
    }

    #[test]
    fn test_last_visit_does_not_move_backwards() {
        let s = setup();
        let doctor_ref = &s.doctor.account_ref;

        s.service
            .add_entry(&identifier(), doctor_ref, details(date(2025, 3, 2), "Viral fever"))
            .unwrap();
        s.service
            .add_entry(&identifier(), doctor_ref, details(date(2025, 1, 10), "Back-dated"))
            .unwrap();

        assert_eq!(
            last_visit(&s.accounts, &s.patient.account_ref),
            Some(date(2025, 3, 2))
        );
    }

    #[test]
    fn test_entries_listed_newest_visit_first() {
        let s = setup();
        let doctor_ref = &s.doctor.account_ref;

        for (d, diagnosis) in [
            (date(2025, 1, 5), "first"),
            (date(2025, 3, 1), "latest"),
            (date(2025, 2, 1), "middle"),
            (date(2025, 3, 1), "latest, second visit"),
        ] {
            s.service
                .add_entry(&identifier(), doctor_ref, details(d, diagnosis))
                .unwrap();
        }

        let listed: Vec<String> = s
            .service
            .entries_for(&identifier())
            .unwrap()
            .into_iter()
            .map(|e| e.details.diagnosis.to_string())
            .collect();
        assert_eq!(listed, ["latest, second visit", "latest", "middle", "first"]);
    }

    #[test]
    fn test_entry_ids_are_monotonic() {
        let s = setup();
        let mut previous: Option<EntryId> = None;

        for _ in 0..20 {
            let entry = s
                .service
                .add_entry(&identifier(), &s.doctor.account_ref, details(date(2025, 3, 2), "x"))
                .unwrap();
            if let Some(prev) = previous {
                assert!(entry.entry_id.timestamp() > prev.timestamp());
                assert!(entry.entry_id.to_string() > prev.to_string());
            }
            previous = Some(entry.entry_id);
        }
    }

    #[test]
    fn test_entry_for_date() {
        let s = setup();
        s.service
            .add_entry(&identifier(), &s.doctor.account_ref, details(date(2025, 3, 2), "Viral fever"))
            .unwrap();

        let found = s
            .service
            .entry_for_date(&identifier(), date(2025, 3, 2))
            .unwrap()
            .expect("entry should exist");
        assert_eq!(found.details.diagnosis.as_str(), "Viral fever");
        assert!(s
            .service
            .entry_for_date(&identifier(), date(2025, 3, 3))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_add_entry_rejects_non_doctor_and_unknown_patient() {
        let s = setup();

        let err = s
            .service
            .add_entry(&identifier(), &s.patient.account_ref, details(date(2025, 3, 2), "x"))
            .unwrap_err();
        assert!(matches!(err, IdentityError::Validation(_)));

        let err = s
            .service
            .add_entry(
                &PatientIdentifier::parse("9998887770").unwrap(),
                &s.doctor.account_ref,
                details(date(2025, 3, 2), "x"),
            )
            .unwrap_err();
        assert!(matches!(err, IdentityError::ProfileNotFound(_)));
        assert!(s.service.entries_for(&identifier()).unwrap().is_empty());
    }

    #[test]
    fn test_add_entry_rejects_next_visit_before_visit() {
        let s = setup();
        let mut d = details(date(2025, 3, 2), "x");
        d.next_visit = Some(date(2025, 3, 1));

        let err = s
            .service
            .add_entry(&identifier(), &s.doctor.account_ref, d)
            .unwrap_err();
        assert!(matches!(err, IdentityError::Validation(_)));
    }

    #[test]
    fn test_signed_out_doctor_cannot_add_entry() {
        let s = setup();
        s.auth.sign_out(&s.doctor.account_ref).unwrap();

        let err = s
            .service
            .add_entry(&identifier(), &s.doctor.account_ref, details(date(2025, 3, 2), "x"))
            .unwrap_err();

        assert!(matches!(err, IdentityError::AuthenticationFailed));
        assert_eq!(err.kind(), ErrorKind::InvalidCredentials);
        assert!(s.service.entries_for(&identifier()).unwrap().is_empty());
        assert_eq!(last_visit(&s.accounts, &s.patient.account_ref), None);
    }

    #[test]
    fn test_update_entry_replaces_details_and_keeps_identity() {
        let s = setup();
        let entry = s
            .service
            .add_entry(&identifier(), &s.doctor.account_ref, details(date(2025, 3, 2), "Viral fever"))
            .unwrap();

        let mut corrected = details(date(2025, 3, 4), "Dengue");
        corrected.next_visit = Some(date(2025, 3, 10));
        let updated = s
            .service
            .update_entry(&identifier(), &entry.entry_id, &s.doctor.account_ref, corrected.clone())
            .expect("update_entry should succeed");

        assert_eq!(updated.entry_id, entry.entry_id);
        assert_eq!(updated.created_at, entry.created_at);
        assert!(updated.updated_at >= entry.updated_at);
        assert_eq!(updated.details, corrected);
        assert_eq!(s.service.entries_for(&identifier()).unwrap(), vec![updated]);
        assert_eq!(
            last_visit(&s.accounts, &s.patient.account_ref),
            Some(date(2025, 3, 4))
        );
    }

    #[test]
    fn test_update_entry_rejections() {
        let s = setup();
        let entry = s
            .service
            .add_entry(&identifier(), &s.doctor.account_ref, details(date(2025, 3, 2), "Viral fever"))
            .unwrap();

        let missing = s
            .service
            .update_entry(
                &identifier(),
                &EntryId::generate(None),
                &s.doctor.account_ref,
                details(date(2025, 3, 2), "x"),
            )
            .unwrap_err();
        assert!(matches!(missing, IdentityError::RecordNotFound(_)));
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let other = crate::account::fixtures::doctor("MCI-5555", "9000000005", "ravi@example.com");
        s.accounts.put(&other).unwrap();
        s.auth.open_session(&other.account_ref).unwrap();
        let not_author = s
            .service
            .update_entry(&identifier(), &entry.entry_id, &other.account_ref, details(date(2025, 3, 2), "x"))
            .unwrap_err();
        assert!(matches!(not_author, IdentityError::Validation(_)));

        s.auth.sign_out(&s.doctor.account_ref).unwrap();
        let signed_out = s
            .service
            .update_entry(&identifier(), &entry.entry_id, &s.doctor.account_ref, details(date(2025, 3, 2), "x"))
            .unwrap_err();
        assert!(matches!(signed_out, IdentityError::AuthenticationFailed));

        assert_eq!(s.service.entries_for(&identifier()).unwrap(), vec![entry]);
    }

    /// Delegates reads and fails every `put`.
    struct ReadOnlyAccounts {
        inner: Arc<InMemoryAccountStore>,
        puts: AtomicUsize,
    }

    impl AccountStore for ReadOnlyAccounts {
        fn put(&self, _account: &Account) -> IdentityResult<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            Err(IdentityError::StorageUnavailable(std::io::Error::other(
                "read-only",
            )))
        }

        fn get(&self, account_ref: &AccountRef) -> IdentityResult<Option<Account>> {
            self.inner.get(account_ref)
        }

        fn find_by(&self, role: Role, field: AccountField, value: &str) -> IdentityResult<Vec<Account>> {
            self.inner.find_by(role, field, value)
        }

        fn list(&self, role: Role) -> IdentityResult<Vec<Account>> {
            self.inner.list(role)
        }
    }

    #[test]
    fn test_last_visit_failure_does_not_fail_entry() {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let read_only = Arc::new(ReadOnlyAccounts {
            inner: accounts.clone(),
            puts: AtomicUsize::new(0),
        });
        let s = setup_with(read_only.clone(), accounts);

        let entry = s
            .service
            .add_entry(&identifier(), &s.doctor.account_ref, details(date(2025, 3, 2), "x"))
            .expect("entry should be saved despite profile update failure");

        assert_eq!(read_only.puts.load(Ordering::SeqCst), 1);
        assert_eq!(s.service.entries_for(&identifier()).unwrap(), vec![entry]);
        assert_eq!(last_visit(&s.accounts, &s.patient.account_ref), None);
    }

    #[test]
    fn test_entry_serializes_flat() {
        let s = setup();
        let entry = s
            .service
            .add_entry(&identifier(), &s.doctor.account_ref, details(date(2025, 3, 2), "Viral fever"))
            .unwrap();

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["visit_date"], "2025-03-02");
        assert_eq!(json["diagnosis"], "Viral fever");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["vitals"]["blood_pressure"], "120/80");
        assert!(json["vitals"].get("height").is_none());

        let back: DailyEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
