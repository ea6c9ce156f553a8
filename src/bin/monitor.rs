//! Monitor binary - temperature sampling daemon.
//!
//! Reads the sensor every 10 seconds, maintains the minute/hour/day rollups,
//! and appends everything to the shared SQLite database.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin monitor            # physical 1-wire sensor
//! cargo run --release --bin monitor -- --mock  # sine-wave generator
//! ```
//!
//! ## Environment Variables
//!
//! - TEMPMON_DB_PATH - SQLite database path (default: data/measurements.db)
//! - RUST_LOG - Logging level (optional, default: info)

use tempmon::config::{self, Config, SourceKind};
use tempmon::monitor_core::{
    AggregationEngine, MeasurementStore, MockSource, ReadingSource, SamplingLoop, W1ThermSource,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    let source_kind = config::parse_source_from_args();

    let source: Box<dyn ReadingSource> = match source_kind {
        SourceKind::Mock => Box::new(MockSource),
        SourceKind::Sensor => Box::new(W1ThermSource::discover()?),
    };

    let store = MeasurementStore::open(&config.db_path)?;
    let engine = AggregationEngine::new(store)?;

    log::info!("🚀 Starting temperature monitor");
    log::info!("   Database: {}", config.db_path);
    log::info!("   Source: {}", source.source_type());

    let mut sampler = SamplingLoop::new(source, engine);

    tokio::select! {
        _ = sampler.run() => {}
        _ = tokio::signal::ctrl_c() => {
            log::info!("🛑 Interrupt received, shutting down");
        }
    }

    // The store handle closes when the sampler drops on the way out
    Ok(())
}
