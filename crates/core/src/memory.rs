//! In-memory store backends.
//!
//! These keep everything in `Mutex`-guarded maps. They give the same consistency guarantees as
//! the file backends (read-after-write, atomic create-if-absent) and are used by tests and by
//! callers that embed the core without a data directory.

use crate::account::{Account, AccountField, AccountStore, Role};
use crate::auth::{Authenticator, PasswordDigest};
use crate::mapping::{IdentifierMapping, MappingStore};
use crate::records::{RecordBuilder, RecordStore, StoredRecord};
use crate::{IdentityError, IdentityResult};
use std::collections::{hash_map::Entry, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use thejas_types::{EmailAddress, PatientIdentifier, Password};
use thejas_uuid::{AccountRef, EntryId};

fn lock<T>(mutex: &Mutex<T>) -> IdentityResult<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| IdentityError::LockPoisoned)
}

#[derive(Debug, Default)]
pub struct InMemoryMappingStore {
    mappings: Mutex<HashMap<PatientIdentifier, IdentifierMapping>>,
}

impl InMemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.mappings.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MappingStore for InMemoryMappingStore {
    fn exists(&self, identifier: &PatientIdentifier) -> IdentityResult<bool> {
        Ok(lock(&self.mappings)?.contains_key(identifier))
    }

    fn create(&self, mapping: &IdentifierMapping) -> IdentityResult<()> {
        match lock(&self.mappings)?.entry(mapping.identifier.clone()) {
            Entry::Occupied(_) => Err(IdentityError::AlreadyExists(mapping.identifier.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(mapping.clone());
                Ok(())
            }
        }
    }

    fn lookup(&self, identifier: &PatientIdentifier) -> IdentityResult<Option<IdentifierMapping>> {
        Ok(lock(&self.mappings)?.get(identifier).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: Mutex<HashMap<AccountRef, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn put(&self, account: &Account) -> IdentityResult<()> {
        lock(&self.accounts)?.insert(account.account_ref.clone(), account.clone());
        Ok(())
    }

    fn get(&self, account_ref: &AccountRef) -> IdentityResult<Option<Account>> {
        Ok(lock(&self.accounts)?.get(account_ref).cloned())
    }

    fn find_by(&self, role: Role, field: AccountField, value: &str) -> IdentityResult<Vec<Account>> {
        let mut found: Vec<Account> = lock(&self.accounts)?
            .values()
            .filter(|a| a.matches(role, field, value))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(found)
    }

    fn list(&self, role: Role) -> IdentityResult<Vec<Account>> {
        let mut found: Vec<Account> = lock(&self.accounts)?
            .values()
            .filter(|a| a.role() == role)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(found)
    }
}

#[derive(Debug)]
struct Credential {
    account_ref: AccountRef,
    digest: PasswordDigest,
}

/// Authenticator holding credentials and sessions in memory.
#[derive(Debug, Default)]
pub struct InMemoryAuthenticator {
    credentials: Mutex<HashMap<String, Credential>>,
    sessions: Mutex<HashSet<AccountRef>>,
}

impl InMemoryAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_count(&self) -> usize {
        self.credentials.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Authenticator for InMemoryAuthenticator {
    fn create_account(&self, email: &EmailAddress, password: &Password) -> IdentityResult<AccountRef> {
        let key = email.as_str().to_ascii_lowercase();
        match lock(&self.credentials)?.entry(key) {
            Entry::Occupied(_) => Err(IdentityError::EmailInUse),
            Entry::Vacant(slot) => {
                let account_ref = AccountRef::new();
                slot.insert(Credential {
                    account_ref: account_ref.clone(),
                    digest: PasswordDigest::new(password)?,
                });
                Ok(account_ref)
            }
        }
    }

    fn sign_in(&self, email: &EmailAddress, password: &Password) -> IdentityResult<AccountRef> {
        let account_ref = {
            let credentials = lock(&self.credentials)?;
            let credential = credentials
                .get(&email.as_str().to_ascii_lowercase())
                .ok_or(IdentityError::AuthenticationFailed)?;
            if !credential.digest.verify(password) {
                return Err(IdentityError::AuthenticationFailed);
            }
            credential.account_ref.clone()
        };
        lock(&self.sessions)?.insert(account_ref.clone());
        Ok(account_ref)
    }

    fn open_session(&self, account_ref: &AccountRef) -> IdentityResult<()> {
        lock(&self.sessions)?.insert(account_ref.clone());
        Ok(())
    }

    fn is_signed_in(&self, account_ref: &AccountRef) -> IdentityResult<bool> {
        Ok(lock(&self.sessions)?.contains(account_ref))
    }

    fn sign_out(&self, account_ref: &AccountRef) -> IdentityResult<()> {
        lock(&self.sessions)?.remove(account_ref);
        Ok(())
    }

    fn delete_account(&self, account_ref: &AccountRef) -> IdentityResult<()> {
        lock(&self.credentials)?.retain(|_, c| &c.account_ref != account_ref);
        lock(&self.sessions)?.remove(account_ref);
        Ok(())
    }
}

/// Records of one kind, grouped per patient in creation order.
#[derive(Debug)]
pub struct InMemoryRecordStore<T> {
    records: Mutex<HashMap<AccountRef, Vec<T>>>,
}

impl<T> InMemoryRecordStore<T> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> Default for InMemoryRecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StoredRecord> RecordStore<T> for InMemoryRecordStore<T> {
    fn append(&self, patient_ref: &AccountRef, build: RecordBuilder<'_, T>) -> IdentityResult<T> {
        let mut records = lock(&self.records)?;
        let patient_records = records.entry(patient_ref.clone()).or_default();
        let record_id = EntryId::generate(patient_records.last().map(|r| r.record_id()));
        let record = build(record_id);
        patient_records.push(record.clone());
        Ok(record)
    }

    fn update(&self, record: &T) -> IdentityResult<()> {
        let mut records = lock(&self.records)?;
        let slot = records
            .get_mut(record.owner())
            .and_then(|list| list.iter_mut().find(|r| r.record_id() == record.record_id()))
            .ok_or_else(|| IdentityError::RecordNotFound(record.record_id().to_string()))?;
        *slot = record.clone();
        Ok(())
    }

    fn get(&self, patient_ref: &AccountRef, record_id: &EntryId) -> IdentityResult<Option<T>> {
        Ok(lock(&self.records)?
            .get(patient_ref)
            .and_then(|list| list.iter().find(|r| r.record_id() == record_id))
            .cloned())
    }

    fn list(&self, patient_ref: &AccountRef) -> IdentityResult<Vec<T>> {
        Ok(lock(&self.records)?
            .get(patient_ref)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::fixtures::patient;
    use serde::{Deserialize, Serialize};
    use thejas_types::{NationalId, NonEmptyText};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: EntryId,
        owner: AccountRef,
        text: String,
    }

    impl StoredRecord for Note {
        fn record_id(&self) -> &EntryId {
            &self.id
        }

        fn owner(&self) -> &AccountRef {
            &self.owner
        }
    }

    fn append_note(store: &InMemoryRecordStore<Note>, owner: &AccountRef, text: &str) -> Note {
        let owner_ref = owner.clone();
        let text = text.to_string();
        store
            .append(
                owner,
                Box::new(move |id| Note {
                    id,
                    owner: owner_ref,
                    text,
                }),
            )
            .expect("append should succeed")
    }

    fn mapping(identifier: &str) -> IdentifierMapping {
        IdentifierMapping::new(
            PatientIdentifier::parse(identifier).unwrap(),
            AccountRef::new(),
            NationalId::parse("490012345678").unwrap(),
            EmailAddress::parse("asha@example.com").unwrap(),
            NonEmptyText::new("Asha Rao").unwrap(),
        )
    }

    #[test]
    fn test_mapping_create_then_lookup_round_trips() {
        let store = InMemoryMappingStore::new();
        let written = mapping("3456781234");

        store.create(&written).expect("create should succeed");

        let read = store
            .lookup(&written.identifier)
            .expect("lookup should succeed")
            .expect("mapping should exist");
        assert_eq!(read, written);
        assert!(store.exists(&written.identifier).unwrap());
    }

    #[test]
    fn test_mapping_create_is_create_if_absent() {
        let store = InMemoryMappingStore::new();
        let first = mapping("3456787777");
        let second = mapping("3456787777");

        store.create(&first).expect("first create should succeed");
        let err = store.create(&second).expect_err("second create should fail");

        assert!(matches!(err, IdentityError::AlreadyExists(id) if id == "3456787777"));
        assert_eq!(
            store.lookup(&first.identifier).unwrap().unwrap().account_ref,
            first.account_ref
        );
    }

    #[test]
    fn test_lookup_absent_is_none() {
        let store = InMemoryMappingStore::new();
        let id = PatientIdentifier::parse("9998887770").unwrap();
        assert!(store.lookup(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
    }

    #[test]
    fn test_account_store_find_by() {
        let store = InMemoryAccountStore::new();
        let a = patient("3456781234", "490012345678", "asha@example.com");
        store.put(&a).unwrap();

        let found = store
            .find_by(Role::Patient, AccountField::NationalId, "490012345678")
            .unwrap();
        assert_eq!(found, vec![a.clone()]);
        assert!(store
            .find_by(Role::Doctor, AccountField::NationalId, "490012345678")
            .unwrap()
            .is_empty());
        assert_eq!(store.get(&a.account_ref).unwrap(), Some(a.clone()));
        assert_eq!(store.list(Role::Patient).unwrap(), vec![a]);
        assert!(store.list(Role::Doctor).unwrap().is_empty());
    }

    #[test]
    fn test_authenticator_lifecycle() {
        let auth = InMemoryAuthenticator::new();
        let email = EmailAddress::parse("Asha@Example.com").unwrap();
        let password = Password::new("correct horse").unwrap();

        let account_ref = auth.create_account(&email, &password).unwrap();
        assert!(matches!(
            auth.create_account(&EmailAddress::parse("asha@example.com").unwrap(), &password),
            Err(IdentityError::EmailInUse)
        ));

        assert!(matches!(
            auth.sign_in(&email, &Password::new("wrong").unwrap()),
            Err(IdentityError::AuthenticationFailed)
        ));
        assert!(!auth.is_signed_in(&account_ref).unwrap());
        assert_eq!(auth.sign_in(&email, &password).unwrap(), account_ref);
        assert!(auth.is_signed_in(&account_ref).unwrap());

        auth.sign_out(&account_ref).unwrap();
        assert!(!auth.is_signed_in(&account_ref).unwrap());

        auth.open_session(&account_ref).unwrap();
        assert!(auth.is_signed_in(&account_ref).unwrap());

        auth.delete_account(&account_ref).unwrap();
        assert_eq!(auth.account_count(), 0);
        assert!(matches!(
            auth.sign_in(&email, &password),
            Err(IdentityError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_record_store_append_update_get() {
        let store = InMemoryRecordStore::<Note>::new();
        let owner = AccountRef::new();

        let first = append_note(&store, &owner, "first");
        let second = append_note(&store, &owner, "second");
        assert!(second.id.timestamp() > first.id.timestamp());

        let mut edited = first.clone();
        edited.text = "first, edited".into();
        store.update(&edited).unwrap();

        assert_eq!(store.get(&owner, &first.id).unwrap(), Some(edited.clone()));
        assert_eq!(store.list(&owner).unwrap(), vec![edited, second]);
        assert!(store.list(&AccountRef::new()).unwrap().is_empty());
    }

    #[test]
    fn test_record_store_update_of_unknown_record_fails() {
        let store = InMemoryRecordStore::<Note>::new();
        let note = Note {
            id: EntryId::generate(None),
            owner: AccountRef::new(),
            text: "never stored".into(),
        };

        assert!(matches!(
            store.update(&note),
            Err(IdentityError::RecordNotFound(_))
        ));
        assert_eq!(store.get(&note.owner, &note.id).unwrap(), None);
    }
}
