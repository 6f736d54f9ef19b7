use super::helpers::{read_json, replace_json, sharded_leaves};
use crate::account::{Account, AccountField, AccountStore, Role};
use crate::constants::PROFILE_FILENAME;
use crate::IdentityResult;
use std::path::PathBuf;
use thejas_uuid::AccountRef;

/// One `profile.json` per account, in a sharded directory named after the account reference.
#[derive(Clone, Debug)]
pub struct FileAccountStore {
    root: PathBuf,
}

impl FileAccountStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path(&self, account_ref: &AccountRef) -> PathBuf {
        account_ref.sharded_dir(&self.root).join(PROFILE_FILENAME)
    }

    /// Every readable profile accepted by `keep`, oldest first.
    fn scan(&self, keep: impl Fn(&Account) -> bool) -> Vec<Account> {
        let mut found = Vec::new();

        for account_dir in sharded_leaves(&self.root) {
            if !account_dir.is_dir() {
                continue;
            }
            let profile_path = account_dir.join(PROFILE_FILENAME);
            if !profile_path.is_file() {
                continue;
            }

            match read_json::<Account>(&profile_path) {
                Ok(Some(account)) if keep(&account) => found.push(account),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %profile_path.display(), error = %e, "skipping unreadable profile");
                }
            }
        }

        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        found
    }
}

impl AccountStore for FileAccountStore {
    fn put(&self, account: &Account) -> IdentityResult<()> {
        replace_json(&self.path(&account.account_ref), account)
    }

    fn get(&self, account_ref: &AccountRef) -> IdentityResult<Option<Account>> {
        read_json(&self.path(account_ref))
    }

    /// Scans every profile. Unreadable or malformed profiles are logged and skipped.
    fn find_by(&self, role: Role, field: AccountField, value: &str) -> IdentityResult<Vec<Account>> {
        Ok(self.scan(|account| account.matches(role, field, value)))
    }

    fn list(&self, role: Role) -> IdentityResult<Vec<Account>> {
        Ok(self.scan(|account| account.role() == role))
    }
}
