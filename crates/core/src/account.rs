//! Accounts and their role-specific profiles.
//!
//! An [`Account`] is the portal's view of one registered person. The authenticator owns the
//! email/password binding and issues the [`AccountRef`]; everything else about the person is
//! a profile document kept in an [`AccountStore`].

use crate::IdentityResult;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thejas_types::{EmailAddress, NationalId, NonEmptyText, PatientIdentifier};
use thejas_uuid::AccountRef;

/// The two kinds of portal user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            other => Err(crate::IdentityError::Validation(format!(
                "unknown role '{}'",
                other
            ))),
        }
    }
}

/// Patient-only profile fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub identifier: PatientIdentifier,
    #[serde(default)]
    pub phone: Option<NonEmptyText>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<NonEmptyText>,
    /// Visit date of the most recent daily entry.
    #[serde(default)]
    pub last_visit: Option<NaiveDate>,
}

/// Doctor-only profile fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub licence_id: NonEmptyText,
    #[serde(default)]
    pub phone: Option<NonEmptyText>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    Patient(PatientProfile),
    Doctor(DoctorProfile),
}

/// One registered person.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_ref: AccountRef,
    pub display_name: NonEmptyText,
    pub national_id: NationalId,
    pub email: EmailAddress,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an [`AccountStore`] can be queried by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountField {
    NationalId,
    Email,
    Phone,
    LicenceId,
    PatientIdentifier,
}

impl Account {
    pub fn role(&self) -> Role {
        match self.profile {
            Profile::Patient(_) => Role::Patient,
            Profile::Doctor(_) => Role::Doctor,
        }
    }

    pub fn patient_identifier(&self) -> Option<&PatientIdentifier> {
        match &self.profile {
            Profile::Patient(p) => Some(&p.identifier),
            Profile::Doctor(_) => None,
        }
    }

    /// The stored value of `field`, if this account has one.
    ///
    /// Email comparisons are case-insensitive in the authenticator, so the email value is
    /// returned as stored and matched with [`Account::matches`].
    pub fn field(&self, field: AccountField) -> Option<&str> {
        match (field, &self.profile) {
            (AccountField::NationalId, _) => Some(self.national_id.as_str()),
            (AccountField::Email, _) => Some(self.email.as_str()),
            (AccountField::Phone, Profile::Patient(p)) => p.phone.as_ref().map(|v| v.as_str()),
            (AccountField::Phone, Profile::Doctor(d)) => d.phone.as_ref().map(|v| v.as_str()),
            (AccountField::LicenceId, Profile::Doctor(d)) => Some(d.licence_id.as_str()),
            (AccountField::LicenceId, Profile::Patient(_)) => None,
            (AccountField::PatientIdentifier, Profile::Patient(p)) => Some(p.identifier.as_str()),
            (AccountField::PatientIdentifier, Profile::Doctor(_)) => None,
        }
    }

    /// Field-equality match used by every [`AccountStore`] backend.
    pub fn matches(&self, role: Role, field: AccountField, value: &str) -> bool {
        if self.role() != role {
            return false;
        }
        let value = value.trim();
        match (field, self.field(field)) {
            (AccountField::Email, Some(stored)) => stored.eq_ignore_ascii_case(value),
            (_, Some(stored)) => stored == value,
            (_, None) => false,
        }
    }

    /// Free-text match for the doctor's patient search.
    ///
    /// `term` matches a case-insensitive prefix of the name or of any word in it, a prefix of
    /// the patient identifier or phone number, or a case-insensitive prefix of the email.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return false;
        }

        let name = self.display_name.as_str().to_lowercase();
        if name.starts_with(&term) || name.split_whitespace().any(|word| word.starts_with(&term)) {
            return true;
        }
        if self.email.as_str().to_lowercase().starts_with(&term) {
            return true;
        }
        [AccountField::PatientIdentifier, AccountField::Phone]
            .into_iter()
            .filter_map(|field| self.field(field))
            .any(|value| value.starts_with(&term))
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            account_ref: self.account_ref.clone(),
            role: self.role(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            identifier: self.patient_identifier().cloned(),
        }
    }
}

/// What a successful login hands back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub account_ref: AccountRef,
    pub role: Role,
    pub display_name: NonEmptyText,
    pub email: EmailAddress,
    pub identifier: Option<PatientIdentifier>,
}

/// Profile documents keyed by account reference.
pub trait AccountStore: Send + Sync {
    /// Creates or replaces the profile for `account.account_ref`.
    fn put(&self, account: &Account) -> IdentityResult<()>;

    fn get(&self, account_ref: &AccountRef) -> IdentityResult<Option<Account>>;

    /// All accounts of `role` whose `field` equals `value`.
    fn find_by(&self, role: Role, field: AccountField, value: &str) -> IdentityResult<Vec<Account>>;

    /// Every account of `role`, oldest first.
    fn list(&self, role: Role) -> IdentityResult<Vec<Account>>;
}
