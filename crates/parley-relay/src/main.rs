use std::env;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use parley_orchestrator::client::OrchestratorClient;
use parley_orchestrator::config::OrchestratorConfig;
use parley_relay::state::AppState;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let bind_addr = env::var("PARLEY_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    let orchestrator = OrchestratorClient::new(OrchestratorConfig::from_env())?;
    let app = parley_relay::app(AppState { orchestrator });

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
