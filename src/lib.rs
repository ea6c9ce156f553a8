//! tempmon - periodic temperature sampling with rolling minute/hour/day
//! averages in SQLite and a read-only HTTP query API.
//!
//! # Architecture
//!
//! ```text
//! SamplingLoop → ReadingSource → AggregationEngine → MeasurementStore
//!                                                         ↑
//!                               Query API (axum) ─────────┘
//! ```
//!
//! The `monitor` binary runs the sampling side (single writer); the `api`
//! binary serves queries over the same database file.

pub mod api;
pub mod config;
pub mod monitor_core;
pub mod sqlite_pragma;
