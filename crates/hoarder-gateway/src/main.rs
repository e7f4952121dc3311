//! Run the Hoarder MCP gateway.
//!
//! Usage: `cargo run --bin hoarder-gateway`

use hoarder_gateway::server::Server;
use hoarder_gateway::GatewayConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = GatewayConfig::from_env()?;
    if !config.has_api_token() {
        tracing::error!(
            "HOARDER_API_KEY is not set; every Hoarder call will fail until it is configured"
        );
    }
    tracing::info!(config = ?config.redacted(), "Starting Hoarder MCP Server");

    let mut server = Server::start(&config).await?;
    tracing::info!("Listening on http://{}", server.addr());

    tokio::signal::ctrl_c()
        .await
        .map_err(|error| format!("failed to listen for shutdown signal: {error}"))?;
    tracing::info!("Shutting down");
    server.shutdown()?;
    server.wait().await;
    Ok(())
}
