use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower::make::Shared;
use tracing_subscriber::EnvFilter;

use admissions_gateway::config::AppConfig;
use admissions_gateway::routes;
use admissions_gateway::state::AppState;
use admissions_gateway::upstream::UpstreamClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        upstream_api_url = %config.redacted_upstream_url(),
        upstream_timeout_seconds = config.upstream_timeout_seconds,
        server_host = %config.server_host,
        server_port = config.server_port,
        cors_restricted = config.cors_allowed_origin.is_some(),
        upload_max_bytes = config.upload_max_bytes,
        "loaded gateway configuration"
    );

    let upstream = UpstreamClient::from_config(&config)?;
    let listen_addr: SocketAddr =
        format!("{}:{}", config.server_host, config.server_port).parse()?;
    let state = AppState::new(config, Arc::new(upstream));
    let router = routes::create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, Shared::new(router)).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
