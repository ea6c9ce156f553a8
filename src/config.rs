//! Environment-based configuration shared by the monitor and api binaries.

use std::env;

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path =
            env::var("TEMPMON_DB_PATH").unwrap_or_else(|_| "data/measurements.db".to_string());
        let api_host = env::var("TEMPMON_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let api_port = match env::var("TEMPMON_API_PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "TEMPMON_API_PORT must be a port number, got '{}'",
                    raw
                ))
            })?,
            Err(_) => 4098,
        };

        Ok(Self {
            db_path,
            api_host,
            api_port,
        })
    }
}

/// Sensor selection for the monitor binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Mock,
    Sensor,
}

/// `--mock` on the command line selects the sine-wave generator; the
/// physical 1-wire sensor is the default.
pub fn parse_source_from_args() -> SourceKind {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "--mock") {
        SourceKind::Mock
    } else {
        SourceKind::Sensor
    }
}
