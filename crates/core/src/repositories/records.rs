use super::helpers::{create_json, json_files, read_json, replace_json};
use crate::constants::JSON_EXTENSION;
use crate::records::{RecordBuilder, RecordStore, StoredRecord};
use crate::{IdentityError, IdentityResult};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thejas_uuid::{AccountRef, EntryId};

/// One JSON file per record, named by its [`EntryId`], in the patient's sharded directory.
///
/// Appends and updates of one store instance are serialised by a single lock; new files are
/// created atomically, so a second process writing the same id fails instead of overwriting.
#[derive(Debug)]
pub struct FileRecordStore<T> {
    root: PathBuf,
    write_lock: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T: StoredRecord> FileRecordStore<T> {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            write_lock: Mutex::new(()),
            _records: PhantomData,
        }
    }

    fn patient_dir(&self, patient_ref: &AccountRef) -> PathBuf {
        patient_ref.sharded_dir(&self.root)
    }

    fn path(&self, patient_ref: &AccountRef, record_id: &EntryId) -> PathBuf {
        self.patient_dir(patient_ref)
            .join(format!("{record_id}.{JSON_EXTENSION}"))
    }

    /// The newest id already on disk for this patient, judged by file name.
    fn last_id(patient_dir: &Path) -> IdentityResult<Option<EntryId>> {
        Ok(json_files(patient_dir)?
            .iter()
            .filter_map(|path| path.file_stem()?.to_str()?.parse::<EntryId>().ok())
            .max_by_key(|id| id.timestamp()))
    }

    fn lock(&self) -> IdentityResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| IdentityError::LockPoisoned)
    }
}

/// Creates `path`, treating an existing file as an id collision rather than a conflict the
/// caller could resolve.
fn write_new<T: StoredRecord>(path: &Path, record: &T) -> IdentityResult<()> {
    if create_json(path, record)? {
        Ok(())
    } else {
        tracing::error!(record_id = %record.record_id(), "record id collided with an existing file");
        Err(IdentityError::RecordIdCollision(record.record_id().to_string()))
    }
}

impl<T: StoredRecord> RecordStore<T> for FileRecordStore<T> {
    fn append(&self, patient_ref: &AccountRef, build: RecordBuilder<'_, T>) -> IdentityResult<T> {
        let _guard = self.lock()?;

        let record_id = EntryId::generate(Self::last_id(&self.patient_dir(patient_ref))?.as_ref());
        let path = self.path(patient_ref, &record_id);
        let record = build(record_id);

        write_new(&path, &record)?;
        Ok(record)
    }

    fn update(&self, record: &T) -> IdentityResult<()> {
        let _guard = self.lock()?;

        let path = self.path(record.owner(), record.record_id());
        if !path.is_file() {
            return Err(IdentityError::RecordNotFound(record.record_id().to_string()));
        }
        replace_json(&path, record)
    }

    fn get(&self, patient_ref: &AccountRef, record_id: &EntryId) -> IdentityResult<Option<T>> {
        read_json(&self.path(patient_ref, record_id))
    }

    fn list(&self, patient_ref: &AccountRef) -> IdentityResult<Vec<T>> {
        let mut records = Vec::new();

        for path in json_files(&self.patient_dir(patient_ref))? {
            match read_json::<T>(&path) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
                }
            }
        }

        Ok(records)
    }
}
