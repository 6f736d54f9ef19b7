use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic_reflection::server::Builder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_grpc::{pb::thejas_server::ThejasServer, ThejasService};
use api_shared::{ApiKeyGuard, FILE_DESCRIPTOR_SET};
use thejas_core::{data_dir_from_env_value, CoreConfig, IdentityService, RandomSuffix, Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("thejas=info".parse()?)
                .add_directive("api_grpc=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = std::env::var("THEJAS_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:50051".into())
        .parse()?;

    tracing::info!("-- Starting Thejas gRPC on {}", addr);

    let data_dir = data_dir_from_env_value(std::env::var("THEJAS_DATA_DIR").ok(), true)?;
    let cfg = Arc::new(CoreConfig::new(data_dir));
    let stores = Stores::file_backed(&cfg);
    let identity = IdentityService::new(cfg, stores, Arc::new(RandomSuffix));

    let guard = ApiKeyGuard::from_env_value(std::env::var("API_KEY").ok())?;

    let mut server_builder = Server::builder().add_service(ThejasServer::with_interceptor(
        ThejasService::new(Arc::new(identity)),
        guard,
    ));

    if std::env::var("THEJAS_ENABLE_REFLECTION").unwrap_or_else(|_| "false".to_string()) == "true"
    {
        let reflection_service = Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        server_builder = server_builder.add_service(reflection_service);
        tracing::info!("gRPC server reflection enabled");
    } else {
        tracing::info!("gRPC server reflection disabled");
    }

    server_builder.serve(addr).await?;

    Ok(())
}
