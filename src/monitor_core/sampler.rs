//! Fixed-cadence sampling loop.
//!
//! One reading every RAW bucket interval. The sleep is shortened by however
//! long the iteration took, so samples land as close as possible to exact
//! 10-second multiples; punctuality is what makes the modulo rollup
//! triggers in the engine fire at all.

use super::bucket::BucketDuration;
use super::engine::AggregationEngine;
use super::reading::ReadingSource;
use chrono::TimeZone;
use std::time::{Duration, Instant};

pub struct SamplingLoop<Tz: TimeZone> {
    source: Box<dyn ReadingSource>,
    engine: AggregationEngine<Tz>,
    cadence: Duration,
}

impl<Tz: TimeZone> SamplingLoop<Tz> {
    pub fn new(source: Box<dyn ReadingSource>, engine: AggregationEngine<Tz>) -> Self {
        Self {
            source,
            engine,
            cadence: Duration::from_secs(BucketDuration::Raw.secs() as u64),
        }
    }

    /// Run until the surrounding task is cancelled. No error is fatal here:
    /// a failed reading abandons the tick, a failed aggregation is logged,
    /// and the loop proceeds to the next cadence tick either way.
    pub async fn run(&mut self) {
        log::info!(
            "⏰ Sampling loop started (source: {}, cadence: {:?})",
            self.source.source_type(),
            self.cadence
        );

        loop {
            let started = Instant::now();

            match self.source.get_reading() {
                Ok(reading) => {
                    log::debug!("Processing {} at {}", reading.value, reading.timestamp);
                    if let Err(e) = self
                        .engine
                        .process_datapoint(reading.value, reading.timestamp)
                    {
                        log::error!("❌ Failed to process sample at {}: {}", reading.timestamp, e);
                    }
                }
                Err(e) => {
                    log::warn!("⚠️  Sensor read failed, skipping tick: {}", e);
                }
            }

            tokio::time::sleep(sleep_duration(self.cadence, started.elapsed())).await;
        }
    }
}

/// Time left until the next cadence tick; zero when the iteration overran.
pub fn sleep_duration(cadence: Duration, elapsed: Duration) -> Duration {
    cadence.saturating_sub(elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_duration_fills_remaining_cadence() {
        let cadence = Duration::from_secs(10);
        assert_eq!(
            sleep_duration(cadence, Duration::from_secs(3)),
            Duration::from_secs(7)
        );
        assert_eq!(
            sleep_duration(cadence, Duration::from_millis(9_900)),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn test_sleep_duration_clamps_on_overrun() {
        let cadence = Duration::from_secs(10);
        assert_eq!(sleep_duration(cadence, Duration::from_secs(10)), Duration::ZERO);
        assert_eq!(sleep_duration(cadence, Duration::from_secs(25)), Duration::ZERO);
    }
}
