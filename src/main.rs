//! PharmaStackX server entry point.
//!
//! Starts the REST API (request/quote workflow, distance enrichment,
//! quote-ready push, carts, pharmacy registry) with the marketplace data
//! directory resolved once at startup.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{build_router, AppState};
use psx_core::constants::DEFAULT_MARKET_DATA_DIR;
use psx_core::CoreConfig;

/// Main entry point for the PharmaStackX application
///
/// Starts the REST server on the configured address and serves the
/// medicine-request workflow, with OpenAPI documentation under
/// `/swagger-ui`.
///
/// # Environment Variables
/// - `PSX_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MARKET_DATA_DIR`: Directory for marketplace data storage (default: "market_data")
/// - `PSX_PHARMACY_API_KEY`: API key authenticating the pharmacy write path
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("psx=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr: SocketAddr = std::env::var("PSX_REST_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".into())
        .parse()?;

    tracing::info!("++ Starting PharmaStackX REST on {}", rest_addr);

    let market_data_dir =
        std::env::var("MARKET_DATA_DIR").unwrap_or_else(|_| DEFAULT_MARKET_DATA_DIR.into());
    let market_data_path = Path::new(&market_data_dir);
    if !market_data_path.exists() {
        std::fs::create_dir_all(market_data_path)?;
        tracing::info!(
            "Created marketplace data directory at {}",
            market_data_path.display()
        );
    }

    let cfg = Arc::new(CoreConfig::new(market_data_path.to_path_buf())?);
    let app = build_router(AppState::new(cfg));

    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
