//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into core services by `Arc`.
//! Services never read process-wide environment variables while handling a request.

use crate::constants::{
    ACCOUNTS_DIR_NAME, APPOINTMENTS_DIR_NAME, CREDENTIALS_DIR_NAME, DEFAULT_ALLOCATION_ATTEMPTS,
    DEFAULT_DATA_DIR, DEFAULT_RACE_RETRIES, ENTRIES_DIR_NAME, MAPPINGS_DIR_NAME,
    PRESCRIPTIONS_DIR_NAME,
};
use crate::{IdentityError, IdentityResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    allocation_attempts: u32,
    race_retries: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig` with the default allocation policy.
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            allocation_attempts: DEFAULT_ALLOCATION_ATTEMPTS,
            race_retries: DEFAULT_RACE_RETRIES,
        }
    }

    /// Overrides the allocation policy.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Validation` if `allocation_attempts` is zero.
    pub fn with_allocation_policy(
        mut self,
        allocation_attempts: u32,
        race_retries: u32,
    ) -> IdentityResult<Self> {
        if allocation_attempts == 0 {
            return Err(IdentityError::Validation(
                "allocation_attempts must be at least 1".into(),
            ));
        }
        self.allocation_attempts = allocation_attempts;
        self.race_retries = race_retries;
        Ok(self)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn mappings_dir(&self) -> PathBuf {
        self.data_dir.join(MAPPINGS_DIR_NAME)
    }

    pub fn accounts_dir(&self) -> PathBuf {
        self.data_dir.join(ACCOUNTS_DIR_NAME)
    }

    pub fn credentials_dir(&self) -> PathBuf {
        self.data_dir.join(CREDENTIALS_DIR_NAME)
    }

    pub fn entries_dir(&self) -> PathBuf {
        self.data_dir.join(ENTRIES_DIR_NAME)
    }

    pub fn prescriptions_dir(&self) -> PathBuf {
        self.data_dir.join(PRESCRIPTIONS_DIR_NAME)
    }

    pub fn appointments_dir(&self) -> PathBuf {
        self.data_dir.join(APPOINTMENTS_DIR_NAME)
    }

    pub fn allocation_attempts(&self) -> u32 {
        self.allocation_attempts
    }

    pub fn race_retries(&self) -> u32 {
        self.race_retries
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(PathBuf::from(DEFAULT_DATA_DIR))
    }
}

/// Resolve the data directory from an optional override value.
///
/// Empty or whitespace-only values fall back to [`DEFAULT_DATA_DIR`]. When `must_exist` is set
/// the directory has to be present already; servers refuse to start against a typo'd path.
pub fn data_dir_from_env_value(value: Option<String>, must_exist: bool) -> IdentityResult<PathBuf> {
    let dir = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    if must_exist && !dir.is_dir() {
        return Err(IdentityError::Validation(format!(
            "data directory does not exist: {}",
            dir.display()
        )));
    }

    Ok(dir)
}
