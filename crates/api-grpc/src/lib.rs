//! # API gRPC
//!
//! gRPC server implementation for Thejas.
//!
//! Handles:
//! - Service implementations backed by the `thejas-core` identity service
//! - Translating core errors into gRPC status codes
//!
//! API key checking and the wire types come from `api-shared`.

#![warn(rust_2018_idioms)]

pub use service::{pb, to_status, ThejasService};

pub mod service;
