//! Validated value types shared across the Thejas workspace.
//!
//! Every type here is checked once at construction so that services further in can
//! take the invariant for granted. Inputs coming from forms are trimmed before
//! validation; passwords are the one exception and are kept exactly as typed.

use std::fmt;
use zeroize::Zeroizing;

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input does not look like an email address
    #[error("invalid email address")]
    InvalidEmail,
    /// The national ID contains something other than ASCII digits
    #[error("national ID must contain only digits")]
    NationalIdNotDigits,
    /// The national ID is too short to seed a patient identifier
    #[error("national ID must be at least {min} digits")]
    NationalIdTooShort { min: usize },
    /// The patient identifier is not exactly ten digits
    #[error("patient identifier must be exactly {len} digits")]
    InvalidPatientIdentifier { len: usize },
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// An authentication email address.
///
/// Validation is shallow: exactly one `@` with something on both sides and no whitespace.
/// Dotless domains such as `localhost` are accepted. The authenticator owns real
/// deliverability checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses and trims an email address.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }

        let (local, domain) = trimmed.split_once('@').ok_or(TextError::InvalidEmail)?;
        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || trimmed.chars().any(char::is_whitespace)
        {
            return Err(TextError::InvalidEmail);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns true when `input` should be treated as an email rather than an identifier.
    ///
    /// Login forms accept several credential shapes in one field; anything containing `@`
    /// is routed as an email.
    pub fn is_email_shaped(input: &str) -> bool {
        input.contains('@')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// An externally issued national identification number.
///
/// Must be ASCII digits only and at least [`NationalId::MIN_LEN`] long, because the last six
/// digits seed the patient identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NationalId(String);

impl NationalId {
    /// Minimum accepted length.
    pub const MIN_LEN: usize = 6;

    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TextError::NationalIdNotDigits);
        }
        if trimmed.len() < Self::MIN_LEN {
            return Err(TextError::NationalIdTooShort { min: Self::MIN_LEN });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The last six digits, used as the patient identifier prefix.
    pub fn suffix(&self) -> &str {
        &self.0[self.0.len() - Self::MIN_LEN..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NationalId {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<NationalId> for String {
    fn from(value: NationalId) -> Self {
        value.0
    }
}

/// The public ten-digit patient identifier printed on the patient's QR card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PatientIdentifier(String);

impl PatientIdentifier {
    /// Number of digits in every identifier.
    pub const LEN: usize = 10;

    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.len() != Self::LEN || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TextError::InvalidPatientIdentifier { len: Self::LEN });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Builds an identifier from a national ID prefix and a four digit suffix.
    ///
    /// `suffix` must lie in `1000..=9999`; anything else is rejected rather than padded.
    pub fn from_parts(national_id: &NationalId, suffix: u16) -> Result<Self, TextError> {
        if !(1000..=9999).contains(&suffix) {
            return Err(TextError::InvalidPatientIdentifier { len: Self::LEN });
        }
        Self::parse(format!("{}{}", national_id.suffix(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PatientIdentifier {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PatientIdentifier> for String {
    fn from(value: PatientIdentifier) -> Self {
        value.0
    }
}

/// A password as typed by the user.
///
/// Never trimmed. The buffer is wiped on drop and `Debug` does not print it.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    pub fn new(input: impl Into<String>) -> Result<Self, TextError> {
        let value = input.into();
        if value.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(Zeroizing::new(value)))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}
