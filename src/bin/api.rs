use snapyx_gateway::{api::start_server, Gateway, GatewayConfig, Provider};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env()?;

    for provider in [Provider::Xai, Provider::OpenAi, Provider::CoinGecko, Provider::Birdeye] {
        if config.credential(provider).is_none() {
            warn!(
                "⚠️  {} not set; {} requests will fail until it is configured",
                provider.credential_var(),
                provider
            );
        }
    }

    let port = config.port;

    info!("🚀 SnapyX Gateway - API Server");
    info!("📍 Port: {}", port);

    let gateway = Arc::new(Gateway::from_config(config)?);

    info!("✅ Gateway initialized");
    info!("📡 Starting API server...");

    start_server(gateway, port).await?;

    Ok(())
}
