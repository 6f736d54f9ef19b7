//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful during development when only the REST server (with OpenAPI/Swagger UI) is wanted. The
//! workspace's main `thejas-run` binary runs both gRPC and REST concurrently.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use thejas_core::{data_dir_from_env_value, CoreConfig, IdentityService, RandomSuffix, Stores};

/// Starts the REST API server.
///
/// # Environment Variables
/// - `THEJAS_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `THEJAS_DATA_DIR`: Data directory, which must already exist (default: "thejas_data")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the data directory does not exist,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("thejas_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("THEJAS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting Thejas REST API on {}", addr);

    let data_dir = data_dir_from_env_value(std::env::var("THEJAS_DATA_DIR").ok(), true)?;
    let cfg = Arc::new(CoreConfig::new(data_dir));
    let stores = Stores::file_backed(&cfg);
    let identity = IdentityService::new(cfg, stores, Arc::new(RandomSuffix));

    let app = router(AppState::new(Arc::new(identity)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
