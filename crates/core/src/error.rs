use thejas_types::TextError;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("invalid input: {0}")]
    Text(#[from] TextError),
    #[error("invalid reference: {0}")]
    Reference(#[from] thejas_uuid::UuidError),

    #[error("no free patient identifier found after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },
    #[error("patient identifier {0} is already taken")]
    AlreadyExists(String),

    #[error("patient identifier not found")]
    IdentifierNotFound,
    #[error("supplied credential does not match the stored value")]
    CredentialMismatch,
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("authenticated account {actual} does not match mapped account {expected}")]
    AccountMismatch { expected: String, actual: String },

    #[error("an account with this email already exists")]
    EmailInUse,
    #[error("this national ID is already registered")]
    NationalIdAlreadyRegistered,
    #[error("a doctor with this medical licence ID is already registered")]
    LicenceAlreadyRegistered,
    #[error("account profile not found: {0}")]
    ProfileNotFound(String),
    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] std::io::Error),
    #[error("password hashing failed: {0}")]
    PasswordHashing(String),
    #[error("record id {0} collided with an existing record")]
    RecordIdCollision(String),
    #[error("storage lock poisoned")]
    LockPoisoned,
    #[error("failed to serialize record: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error(
        "registration failed and rollback also failed (account: {account}): registration={registration_error}; rollback={rollback_error}"
    )]
    RegistrationRollbackFailed {
        account: String,
        #[source]
        registration_error: Box<IdentityError>,
        rollback_error: Box<IdentityError>,
    },
}

/// Coarse classification used by the API layers to choose status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    InvalidCredentials,
    Conflict,
    NotFound,
    RetryRegistration,
    Unavailable,
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Text(_) | Self::Reference(_) => ErrorKind::InvalidInput,
            Self::IdentifierNotFound
            | Self::CredentialMismatch
            | Self::AuthenticationFailed
            | Self::AccountMismatch { .. } => ErrorKind::InvalidCredentials,
            Self::EmailInUse | Self::NationalIdAlreadyRegistered | Self::LicenceAlreadyRegistered => {
                ErrorKind::Conflict
            }
            Self::ProfileNotFound(_) | Self::RecordNotFound(_) => ErrorKind::NotFound,
            Self::AllocationExhausted { .. } | Self::AlreadyExists(_) => {
                ErrorKind::RetryRegistration
            }
            Self::StorageUnavailable(_)
            | Self::PasswordHashing(_)
            | Self::RecordIdCollision(_)
            | Self::LockPoisoned
            | Self::Serialization(_)
            | Self::Deserialization(_)
            | Self::RegistrationRollbackFailed { .. } => ErrorKind::Unavailable,
        }
    }

    /// Short, non-technical text that is safe to show to the person at the keyboard.
    ///
    /// Credential failures all read the same so the message does not reveal which half of
    /// the input was wrong.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Text(_) | Self::Reference(_) => {
                "Please check the details you entered."
            }
            Self::EmailInUse => "An account with this email already exists.",
            Self::NationalIdAlreadyRegistered => {
                "This national ID is already registered. Please contact support."
            }
            Self::LicenceAlreadyRegistered => {
                "A doctor with this medical licence ID is already registered."
            }
            Self::ProfileNotFound(_) | Self::RecordNotFound(_) => "Record not found.",
            _ => match self.kind() {
                ErrorKind::InvalidCredentials => "Invalid credentials.",
                ErrorKind::RetryRegistration => "Please retry registration.",
                _ => "Service unavailable, please try again.",
            },
        }
    }
}

pub type IdentityResult<T> = std::result::Result<T, IdentityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_share_one_message() {
        let not_found = IdentityError::IdentifierNotFound;
        let mismatch = IdentityError::CredentialMismatch;
        let wrong_password = IdentityError::AuthenticationFailed;

        assert_eq!(not_found.user_message(), "Invalid credentials.");
        assert_eq!(mismatch.user_message(), not_found.user_message());
        assert_eq!(wrong_password.user_message(), not_found.user_message());
        assert_eq!(not_found.kind(), ErrorKind::InvalidCredentials);
    }

    #[test]
    fn test_storage_errors_are_generic() {
        let err = IdentityError::StorageUnavailable(std::io::Error::other("disk on fire"));
        assert_eq!(err.user_message(), "Service unavailable, please try again.");
        assert!(!err.user_message().contains("disk"));
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_allocation_exhausted_asks_for_retry() {
        let err = IdentityError::AllocationExhausted { attempts: 10 };
        assert_eq!(err.user_message(), "Please retry registration.");
        assert_eq!(err.to_string(), "no free patient identifier found after 10 attempts");
    }

    #[test]
    fn test_record_id_collision_is_not_a_registration_retry() {
        let err = IdentityError::RecordIdCollision("01J0000000000000000000000".into());
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(err.user_message(), "Service unavailable, please try again.");
    }
}
