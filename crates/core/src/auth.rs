//! The authenticator boundary.
//!
//! The authenticator owns the email/password binding and issues account references. The core
//! never stores or compares passwords itself; it hands `(email, password)` to an
//! [`Authenticator`] and trusts the answer.

use crate::{IdentityError, IdentityResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use thejas_types::{EmailAddress, Password};
use thejas_uuid::AccountRef;

pub trait Authenticator: Send + Sync {
    /// Creates a credential for `email`.
    ///
    /// # Errors
    ///
    /// [`IdentityError::EmailInUse`](crate::IdentityError::EmailInUse) if the email (compared
    /// case-insensitively) already has a credential.
    fn create_account(&self, email: &EmailAddress, password: &Password) -> IdentityResult<AccountRef>;

    /// Verifies `(email, password)` and opens a session.
    ///
    /// # Errors
    ///
    /// [`IdentityError::AuthenticationFailed`](crate::IdentityError::AuthenticationFailed) for
    /// an unknown email or a wrong password alike.
    fn sign_in(&self, email: &EmailAddress, password: &Password) -> IdentityResult<AccountRef>;

    /// Opens a session for an account whose identity was proven without a password
    /// (patient identifier plus national ID).
    fn open_session(&self, account_ref: &AccountRef) -> IdentityResult<()>;

    /// True while `account_ref` has an open session.
    fn is_signed_in(&self, account_ref: &AccountRef) -> IdentityResult<bool>;

    /// Closes the session of `account_ref`. Closing an absent session is not an error.
    fn sign_out(&self, account_ref: &AccountRef) -> IdentityResult<()>;

    /// Removes the credential of an account whose registration did not complete.
    fn delete_account(&self, account_ref: &AccountRef) -> IdentityResult<()>;
}

/// Argon2id hash of a password in PHC string format (`$argon2id$v=19$...`).
///
/// The string carries its own salt and cost parameters, so digests written under older
/// parameters keep verifying.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Hashes `password` under a fresh random salt.
    pub fn new(password: &Password) -> IdentityResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.expose().as_bytes(), &salt)
            .map_err(|e| IdentityError::PasswordHashing(e.to_string()))?;
        Ok(Self(hash.to_string()))
    }

    /// False for a wrong password and for a digest that does not parse.
    pub fn verify(&self, password: &Password) -> bool {
        let parsed = match PasswordHash::new(&self.0) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!(error = %e, "stored password digest is malformed");
                return false;
            }
        };
        Argon2::default()
            .verify_password(password.expose().as_bytes(), &parsed)
            .is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
