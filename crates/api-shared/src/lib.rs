//! # API Shared
//!
//! Shared utilities and definitions for the Thejas APIs.
//!
//! Contains:
//! - Protobuf-generated types (`pb` module)
//! - Conversions between wire messages and core types (`convert`)
//! - Shared services like `HealthService`
//! - API key checking (`auth`)
//!
//! Used by `api-grpc` and `api-rest` for common functionality.

// The generated code is placed into OUT_DIR at build time by the build script.
pub mod pb {
    tonic::include_proto!("thejas.v1");
}

pub mod auth;
pub mod convert;
pub mod health;

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("proto_descriptor");

pub use auth::{ApiKeyError, ApiKeyGuard};
pub use health::HealthService;
pub use pb::*;
