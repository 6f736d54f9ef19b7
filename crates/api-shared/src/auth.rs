//! API key checking for the gRPC surface.
//!
//! The expected key is read once at startup into an [`ApiKeyGuard`]; the guard is then
//! installed as a tonic interceptor and checks the `x-api-key` header of every call.

use std::{fmt, sync::Arc};
use subtle::ConstantTimeEq;
use tonic::{service::Interceptor, Request, Status};

/// Metadata key carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, thiserror::Error)]
pub enum ApiKeyError {
    #[error("API_KEY not set in environment")]
    Missing,
    #[error("API_KEY must not be empty")]
    Empty,
}

#[derive(Clone)]
pub struct ApiKeyGuard {
    expected: Arc<str>,
}

impl ApiKeyGuard {
    pub fn new(key: impl Into<String>) -> Result<Self, ApiKeyError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ApiKeyError::Empty);
        }
        Ok(Self {
            expected: Arc::from(key),
        })
    }

    /// Builds the guard from the raw value of the `API_KEY` variable.
    pub fn from_env_value(value: Option<String>) -> Result<Self, ApiKeyError> {
        Self::new(value.ok_or(ApiKeyError::Missing)?)
    }

    /// Validates the provided API key.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self, provided_key: &str) -> Result<(), Status> {
        let matches: bool = self
            .expected
            .as_bytes()
            .ct_eq(provided_key.as_bytes())
            .into();

        if matches {
            Ok(())
        } else {
            Err(Status::unauthenticated("Invalid API key"))
        }
    }
}

impl fmt::Debug for ApiKeyGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKeyGuard(<redacted>)")
    }
}

impl Interceptor for ApiKeyGuard {
    fn call(&mut self, req: Request<()>) -> Result<Request<()>, Status> {
        let api_key = req
            .metadata()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Status::unauthenticated("Missing x-api-key header"))?;

        self.validate(api_key)?;
        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    fn request_with_key(key: &str) -> Request<()> {
        let mut req = Request::new(());
        req.metadata_mut()
            .insert(API_KEY_HEADER, key.parse().expect("valid metadata value"));
        req
    }

    #[test]
    fn test_interceptor_accepts_matching_key() {
        let mut guard = ApiKeyGuard::new("s3cret").unwrap();
        assert!(guard.call(request_with_key("s3cret")).is_ok());
    }

    #[test]
    fn test_interceptor_rejects_wrong_or_missing_key() {
        let mut guard = ApiKeyGuard::new("s3cret").unwrap();

        let wrong = guard.call(request_with_key("s3cret2")).unwrap_err();
        assert_eq!(wrong.code(), Code::Unauthenticated);

        let missing = guard.call(Request::new(())).unwrap_err();
        assert_eq!(missing.code(), Code::Unauthenticated);
        assert_eq!(missing.message(), "Missing x-api-key header");
    }

    #[test]
    fn test_validate_compares_whole_key() {
        let guard = ApiKeyGuard::new("s3cret").unwrap();

        assert!(guard.validate("s3cret").is_ok());
        for wrong in ["", "s3cre", "s3cret ", "S3cret", "s3cret-and-more"] {
            let err = guard.validate(wrong).unwrap_err();
            assert_eq!(err.code(), Code::Unauthenticated, "{wrong:?}");
            assert_eq!(err.message(), "Invalid API key");
        }
    }

    #[test]
    fn test_guard_requires_a_key() {
        assert!(matches!(
            ApiKeyGuard::from_env_value(None),
            Err(ApiKeyError::Missing)
        ));
        assert!(matches!(
            ApiKeyGuard::from_env_value(Some("  ".into())),
            Err(ApiKeyError::Empty)
        ));
        assert_eq!(
            format!("{:?}", ApiKeyGuard::new("s3cret").unwrap()),
            "ApiKeyGuard(<redacted>)"
        );
    }
}
