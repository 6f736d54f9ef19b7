//! Build script for the `api-grpc` crate.
//!
//! Protobuf generation lives in `api-shared`; this crate generates nothing at build time.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Ok(())
}
