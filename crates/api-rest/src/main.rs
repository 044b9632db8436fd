//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want
//! the REST server (with OpenAPI/Swagger UI). The workspace's main
//! `psx-run` binary is the deployment entry point.

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{build_router, AppState};
use psx_core::constants::DEFAULT_MARKET_DATA_DIR;
use psx_core::CoreConfig;

/// Main entry point for the PharmaStackX REST API server
///
/// Starts the REST API server on the configured address (default:
/// 0.0.0.0:3000). Provides HTTP endpoints for the medicine-request
/// workflow with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `PSX_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `MARKET_DATA_DIR`: Directory for marketplace data storage
/// - `PSX_PHARMACY_API_KEY`: API key for the pharmacy write path
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the marketplace data directory does not exist,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("PSX_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting PharmaStackX REST API on {}", addr);

    let market_data_dir =
        std::env::var("MARKET_DATA_DIR").unwrap_or_else(|_| DEFAULT_MARKET_DATA_DIR.into());
    let market_data_path = Path::new(&market_data_dir);
    if !market_data_path.exists() {
        anyhow::bail!(
            "Marketplace data directory does not exist: {}",
            market_data_path.display()
        );
    }

    let cfg = Arc::new(CoreConfig::new(market_data_path.to_path_buf())?);
    let app = build_router(AppState::new(cfg));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
