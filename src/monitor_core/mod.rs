//! Monitor core - sampling, rollup aggregation, and durable measurement storage.
//!
//! # Data flow
//!
//! ```text
//! SamplingLoop (10s cadence)
//!     ↓
//! ReadingSource (mock sine wave or 1-wire sensor)
//!     ↓
//! AggregationEngine (minute/hour modulo triggers + calendar-day rollover)
//!     ↓
//! MeasurementStore (SQLite, one atomic batch per sample)
//! ```

pub mod bucket;
pub mod engine;
pub mod reading;
pub mod sampler;
pub mod store;

pub use bucket::BucketDuration;
pub use engine::AggregationEngine;
pub use reading::{MockSource, Reading, ReadingSource, SensorError, W1ThermSource};
pub use sampler::SamplingLoop;
pub use store::{Measurement, MeasurementStore, StoreError};
