//! API binary - read-only HTTP query service.
//!
//! Serves the stored series over GET endpoints: `/latest`, `/all`,
//! `/minutes`, `/hours`, `/days`, plus `/` as a liveness probe.
//!
//! ## Environment Variables
//!
//! - TEMPMON_DB_PATH - SQLite database path (default: data/measurements.db)
//! - TEMPMON_API_HOST - Bind address (default: 0.0.0.0)
//! - TEMPMON_API_PORT - Listen port (default: 4098)
//! - RUST_LOG - Logging level (optional, default: info)

use std::net::SocketAddr;
use tempmon::api;
use tempmon::config::Config;
use tempmon::monitor_core::MeasurementStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    let store = MeasurementStore::open(&config.db_path)?;

    let addr: SocketAddr = format!("{}:{}", config.api_host, config.api_port).parse()?;

    log::info!("🚀 Starting query API");
    log::info!("   Database: {}", config.db_path);

    api::run_server(store, addr).await?;

    log::info!("Server done.");
    Ok(())
}
