//! Measurement acquisition.
//!
//! The engine and sampling loop depend only on the [`ReadingSource`] seam,
//! so the physical sensor can be swapped for the mock generator in local
//! runs and tests.

use chrono::Utc;
use std::f64::consts::PI;
use std::fs;
use std::path::PathBuf;

#[derive(Debug)]
pub enum SensorError {
    Io(std::io::Error),
    NoSensor(String),
    Malformed(String),
}

impl From<std::io::Error> for SensorError {
    fn from(err: std::io::Error) -> Self {
        SensorError::Io(err)
    }
}

impl std::fmt::Display for SensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorError::Io(e) => write!(f, "IO error: {}", e),
            SensorError::NoSensor(msg) => write!(f, "No sensor found: {}", msg),
            SensorError::Malformed(msg) => write!(f, "Malformed sensor output: {}", msg),
        }
    }
}

impl std::error::Error for SensorError {}

/// One observation: the measured value and the UTC second it was taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub timestamp: i64,
}

pub trait ReadingSource: Send {
    /// Retrieve the instantaneous measurement and its UTC timestamp.
    fn get_reading(&mut self) -> Result<Reading, SensorError>;

    /// Get source type for logging
    fn source_type(&self) -> &'static str;
}

/// Deterministic generator for local testing: a sine wave with a 20-minute
/// period, rescaled from [-1, 1] to [0, 100].
pub struct MockSource;

impl ReadingSource for MockSource {
    fn get_reading(&mut self) -> Result<Reading, SensorError> {
        let timestamp = Utc::now().timestamp();
        let point = (timestamp as f64 * PI / 600.0).sin();
        Ok(Reading {
            value: (point + 1.0) / 2.0 * 100.0,
            timestamp,
        })
    }

    fn source_type(&self) -> &'static str {
        "mock"
    }
}

/// DS18B20-style thermometer exposed through the kernel's 1-wire sysfs
/// interface. Values are reported in Fahrenheit.
pub struct W1ThermSource {
    slave_path: PathBuf,
}

impl W1ThermSource {
    const W1_DEVICES_DIR: &'static str = "/sys/bus/w1/devices";

    /// Discover the first DS18B20 slave (family code 28) on the bus.
    pub fn discover() -> Result<Self, SensorError> {
        for entry in fs::read_dir(Self::W1_DEVICES_DIR)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with("28-") {
                return Ok(Self {
                    slave_path: entry.path().join("w1_slave"),
                });
            }
        }
        Err(SensorError::NoSensor(format!(
            "no DS18B20 slave under {}",
            Self::W1_DEVICES_DIR
        )))
    }

    pub fn with_slave_path(path: impl Into<PathBuf>) -> Self {
        Self {
            slave_path: path.into(),
        }
    }

    /// Parse the milli-Celsius reading out of a w1_slave dump:
    ///
    /// ```text
    /// 5f 01 4b 46 7f ff 01 10 a0 : crc=a0 YES
    /// 5f 01 4b 46 7f ff 01 10 a0 t=21937
    /// ```
    fn parse_millicelsius(raw: &str) -> Result<i64, SensorError> {
        let first_line = raw
            .lines()
            .next()
            .ok_or_else(|| SensorError::Malformed("empty w1_slave output".to_string()))?;
        if !first_line.trim_end().ends_with("YES") {
            return Err(SensorError::Malformed(
                "sensor CRC check failed".to_string(),
            ));
        }

        raw.lines()
            .find_map(|line| line.rsplit_once("t=").map(|(_, t)| t.trim()))
            .and_then(|t| t.parse::<i64>().ok())
            .ok_or_else(|| SensorError::Malformed("no t= field in w1_slave output".to_string()))
    }
}

impl ReadingSource for W1ThermSource {
    fn get_reading(&mut self) -> Result<Reading, SensorError> {
        let raw = fs::read_to_string(&self.slave_path)?;
        let celsius = Self::parse_millicelsius(&raw)? as f64 / 1000.0;
        Ok(Reading {
            value: celsius * 9.0 / 5.0 + 32.0,
            timestamp: Utc::now().timestamp(),
        })
    }

    fn source_type(&self) -> &'static str {
        "w1-therm"
    }
}
