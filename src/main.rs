use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_grpc::ThejasService;
use api_rest::{router, AppState};
use api_shared::pb::thejas_server::ThejasServer;
use api_shared::ApiKeyGuard;
use thejas_core::{data_dir_from_env_value, CoreConfig, IdentityService, RandomSuffix, Stores};

/// Main entry point for Thejas
///
/// Starts both gRPC and REST servers concurrently over one shared identity service:
/// - gRPC server on port 50051 (configurable via THEJAS_ADDR)
/// - REST server on port 3000 (configurable via THEJAS_REST_ADDR)
///
/// The gRPC server requires authentication via the x-api-key header.
///
/// # Environment Variables
/// - `THEJAS_ADDR`: gRPC server address (default: "0.0.0.0:50051")
/// - `THEJAS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `THEJAS_DATA_DIR`: Data directory, which must already exist (default: "thejas_data")
/// - `API_KEY`: API key for gRPC authentication
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("thejas=info".parse()?)
                .add_directive("thejas_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let grpc_addr: SocketAddr = std::env::var("THEJAS_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:50051".into())
        .parse()?;
    let rest_addr = std::env::var("THEJAS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting Thejas gRPC on {}", grpc_addr);
    tracing::info!("++ Starting Thejas REST on {}", rest_addr);

    let data_dir = data_dir_from_env_value(std::env::var("THEJAS_DATA_DIR").ok(), true)?;
    let cfg = Arc::new(CoreConfig::new(data_dir));
    let stores = Stores::file_backed(&cfg);
    let identity = Arc::new(IdentityService::new(cfg, stores, Arc::new(RandomSuffix)));

    let guard = ApiKeyGuard::from_env_value(std::env::var("API_KEY").ok())?;

    // Start REST server
    let rest_app = router(AppState::new(identity.clone()));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    let rest_server = tokio::spawn(async move { axum::serve(listener, rest_app).await });

    // Start gRPC server
    let grpc_server = Server::builder()
        .add_service(ThejasServer::with_interceptor(
            ThejasService::new(identity),
            guard,
        ))
        .serve(grpc_addr);

    // Run both
    let (rest_result, grpc_result) = tokio::join!(rest_server, grpc_server);
    rest_result??;
    grpc_result?;

    Ok(())
}
