use super::helpers::{create_json, read_json, shard_dir, sharded_leaves};
use crate::auth::{Authenticator, PasswordDigest};
use crate::constants::CREDENTIAL_FILENAME;
use crate::{IdentityError, IdentityResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thejas_types::{EmailAddress, Password};
use thejas_uuid::AccountRef;

#[derive(Debug, Serialize, Deserialize)]
struct CredentialRecord {
    email: EmailAddress,
    account_ref: AccountRef,
    digest: PasswordDigest,
    created_at: DateTime<Utc>,
}

/// Local authenticator keeping one Argon2 password hash per email on disk.
///
/// Credentials are keyed by the SHA-256 of the lowercased email, so the directory layout does
/// not reveal addresses. Sessions are process-local.
#[derive(Debug)]
pub struct FileAuthenticator {
    root: PathBuf,
    sessions: Mutex<HashSet<AccountRef>>,
}

impl FileAuthenticator {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            sessions: Mutex::new(HashSet::new()),
        }
    }

    fn path(&self, email: &EmailAddress) -> PathBuf {
        let key = hex::encode(Sha256::digest(email.as_str().to_ascii_lowercase().as_bytes()));
        shard_dir(&self.root, &key).join(&key).join(CREDENTIAL_FILENAME)
    }

    fn sessions(&self) -> IdentityResult<std::sync::MutexGuard<'_, HashSet<AccountRef>>> {
        self.sessions.lock().map_err(|_| IdentityError::LockPoisoned)
    }
}

impl Authenticator for FileAuthenticator {
    fn create_account(&self, email: &EmailAddress, password: &Password) -> IdentityResult<AccountRef> {
        let record = CredentialRecord {
            email: email.clone(),
            account_ref: AccountRef::new(),
            digest: PasswordDigest::new(password)?,
            created_at: Utc::now(),
        };

        if !create_json(&self.path(email), &record)? {
            return Err(IdentityError::EmailInUse);
        }
        Ok(record.account_ref)
    }

    fn sign_in(&self, email: &EmailAddress, password: &Password) -> IdentityResult<AccountRef> {
        let record: CredentialRecord =
            read_json(&self.path(email))?.ok_or(IdentityError::AuthenticationFailed)?;

        if !record.digest.verify(password) {
            return Err(IdentityError::AuthenticationFailed);
        }

        self.sessions()?.insert(record.account_ref.clone());
        Ok(record.account_ref)
    }

    fn open_session(&self, account_ref: &AccountRef) -> IdentityResult<()> {
        self.sessions()?.insert(account_ref.clone());
        Ok(())
    }

    fn is_signed_in(&self, account_ref: &AccountRef) -> IdentityResult<bool> {
        Ok(self.sessions()?.contains(account_ref))
    }

    fn sign_out(&self, account_ref: &AccountRef) -> IdentityResult<()> {
        self.sessions()?.remove(account_ref);
        Ok(())
    }

    /// Finds the credential by scanning, since records are keyed by email.
    fn delete_account(&self, account_ref: &AccountRef) -> IdentityResult<()> {
        for credential_dir in sharded_leaves(&self.root) {
            let path = credential_dir.join(CREDENTIAL_FILENAME);
            let record = match read_json::<CredentialRecord>(&path) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable credential");
                    continue;
                }
            };

            if &record.account_ref == account_ref {
                fs::remove_dir_all(&credential_dir).map_err(IdentityError::StorageUnavailable)?;
                self.sessions()?.remove(account_ref);
                return Ok(());
            }
        }
        Ok(())
    }
}
