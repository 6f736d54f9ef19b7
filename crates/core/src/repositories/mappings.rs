use super::helpers::{create_json, read_json, shard_dir};
use crate::constants::JSON_EXTENSION;
use crate::mapping::{IdentifierMapping, MappingStore};
use crate::{IdentityError, IdentityResult};
use std::path::PathBuf;
use thejas_types::PatientIdentifier;

/// One JSON file per identifier, created atomically and never rewritten.
#[derive(Clone, Debug)]
pub struct FileMappingStore {
    root: PathBuf,
}

impl FileMappingStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path(&self, identifier: &PatientIdentifier) -> PathBuf {
        let id = identifier.as_str();
        shard_dir(&self.root, id).join(format!("{id}.{JSON_EXTENSION}"))
    }
}

impl MappingStore for FileMappingStore {
    fn exists(&self, identifier: &PatientIdentifier) -> IdentityResult<bool> {
        self.path(identifier)
            .try_exists()
            .map_err(IdentityError::StorageUnavailable)
    }

    fn create(&self, mapping: &IdentifierMapping) -> IdentityResult<()> {
        if create_json(&self.path(&mapping.identifier), mapping)? {
            Ok(())
        } else {
            Err(IdentityError::AlreadyExists(mapping.identifier.to_string()))
        }
    }

    fn lookup(&self, identifier: &PatientIdentifier) -> IdentityResult<Option<IdentifierMapping>> {
        read_json(&self.path(identifier))
    }
}
