//! Credential resolution.
//!
//! Login forms take one free-text field plus either a password or a national ID. The resolver
//! works out which account that input points at without ever seeing the password:
//!
//! | login input      | secondary   | result                                             |
//! |------------------|-------------|----------------------------------------------------|
//! | contains `@`     | password    | the input itself, as the authentication email      |
//! | patient id       | password    | mapped email (+ mapped account to check against)   |
//! | patient id       | national ID | mapped account, if the national ID matches exactly |
//!
//! The national-ID path skips password verification entirely. That is current portal policy,
//! kept as is; see DESIGN.md.
//!
//! Doctors log in with an email, a phone number or their medical licence ID, resolved against
//! doctor profiles in that order.

use crate::account::{AccountField, AccountStore, Role};
use crate::mapping::MappingStore;
use crate::{IdentityError, IdentityResult};
use std::sync::Arc;
use thejas_types::{EmailAddress, NationalId, PatientIdentifier};
use thejas_uuid::AccountRef;

/// Outcome of a resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Authenticate `email` with the password next.
    ///
    /// `expected_account` is set when the email came from a mapping; the authenticator's
    /// answer must then be that account.
    Email {
        email: EmailAddress,
        expected_account: Option<AccountRef>,
    },
    /// Already identified; no password step follows.
    Account(AccountRef),
}

#[derive(Clone)]
pub struct CredentialResolver {
    mappings: Arc<dyn MappingStore>,
    accounts: Arc<dyn AccountStore>,
}

impl CredentialResolver {
    pub fn new(mappings: Arc<dyn MappingStore>, accounts: Arc<dyn AccountStore>) -> Self {
        Self { mappings, accounts }
    }

    /// Resolves patient login input.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::Validation`] for blank input, a malformed identifier, or a national
    ///   ID supplied with an email (that factor only exists for identifiers). No store call is
    ///   made in these cases.
    /// - [`IdentityError::IdentifierNotFound`] if no mapping exists.
    /// - [`IdentityError::CredentialMismatch`] if the national ID differs from the mapped one.
    pub fn resolve(
        &self,
        login_input: &str,
        national_id: Option<&NationalId>,
    ) -> IdentityResult<Resolution> {
        let login_input = login_input.trim();
        if login_input.is_empty() {
            return Err(IdentityError::Validation("login input is required".into()));
        }

        if EmailAddress::is_email_shaped(login_input) {
            if national_id.is_some() {
                return Err(IdentityError::Validation(
                    "national ID login requires a patient identifier".into(),
                ));
            }
            return Ok(Resolution::Email {
                email: EmailAddress::parse(login_input)?,
                expected_account: None,
            });
        }

        let identifier = PatientIdentifier::parse(login_input)?;
        let mapping = self
            .mappings
            .lookup(&identifier)?
            .ok_or(IdentityError::IdentifierNotFound)?;

        match national_id {
            None => Ok(Resolution::Email {
                email: mapping.email,
                expected_account: Some(mapping.account_ref),
            }),
            Some(supplied) if supplied.as_str() == mapping.national_id.as_str() => {
                Ok(Resolution::Account(mapping.account_ref))
            }
            Some(_) => {
                tracing::info!(identifier = %identifier, "national ID did not match mapping");
                Err(IdentityError::CredentialMismatch)
            }
        }
    }

    /// Resolves doctor login input to an authentication email.
    ///
    /// Phone matches win over licence ID matches; with several matches the earliest-created
    /// profile is used.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::Validation`] for blank input or a malformed email.
    /// - [`IdentityError::IdentifierNotFound`] if no doctor profile matches.
    pub fn resolve_doctor(&self, login_input: &str) -> IdentityResult<EmailAddress> {
        let login_input = login_input.trim();
        if login_input.is_empty() {
            return Err(IdentityError::Validation("login input is required".into()));
        }

        if EmailAddress::is_email_shaped(login_input) {
            return Ok(EmailAddress::parse(login_input)?);
        }

        for field in [AccountField::Phone, AccountField::LicenceId] {
            if let Some(account) = self
                .accounts
                .find_by(Role::Doctor, field, login_input)?
                .into_iter()
                .next()
            {
                return Ok(account.email);
            }
        }

        Err(IdentityError::IdentifierNotFound)
    }
}
