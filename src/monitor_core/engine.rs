//! Rollup aggregation engine.
//!
//! Called once per raw sample, in increasing-timestamp order. Decides which
//! minute/hour/day averages are due, computes them over strictly-prior RAW
//! rows, and commits the rollups plus the raw sample as one transaction.

use super::bucket::BucketDuration;
use super::store::{Measurement, MeasurementStore, StoreError};
use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Core aggregation pipeline. Owns the local-midnight day-start reference
/// used to detect calendar-day rollover.
///
/// Generic over the timezone so tests can pin a `FixedOffset`; production
/// uses [`chrono::Local`].
pub struct AggregationEngine<Tz: TimeZone> {
    store: MeasurementStore,
    tz: Tz,
    /// Local midnight of the day the most recent sample belongs to, as a
    /// naive local datetime.
    day_start: NaiveDateTime,
}

impl AggregationEngine<Local> {
    pub fn new(store: MeasurementStore) -> Result<Self, StoreError> {
        Self::with_timezone(store, Local)
    }
}

impl<Tz: TimeZone> AggregationEngine<Tz> {
    /// Build the engine, reconstructing the day-start reference from the
    /// most recent stored row, or from the current time on an empty store.
    pub fn with_timezone(store: MeasurementStore, tz: Tz) -> Result<Self, StoreError> {
        let seed = match store.last_timestamp()? {
            Some(ts) => ts,
            None => Utc::now().timestamp(),
        };
        let day_start = Self::local_midnight(&tz, seed);
        Ok(Self {
            store,
            tz,
            day_start,
        })
    }

    pub fn store(&self) -> &MeasurementStore {
        &self.store
    }

    pub fn day_start(&self) -> NaiveDateTime {
        self.day_start
    }

    /// Convert a UTC timestamp to naive local time. Resolved per call so a
    /// DST transition mid-run shifts which UTC instants map to midnight.
    fn local_datetime(tz: &Tz, utc_timestamp: i64) -> NaiveDateTime {
        DateTime::from_timestamp(utc_timestamp, 0)
            .unwrap_or_default()
            .with_timezone(tz)
            .naive_local()
    }

    fn local_midnight(tz: &Tz, utc_timestamp: i64) -> NaiveDateTime {
        Self::local_datetime(tz, utc_timestamp)
            .date()
            .and_time(NaiveTime::MIN)
    }

    /// Process one raw sample: fire any due rollups, append the raw row, and
    /// commit the whole batch atomically.
    ///
    /// Rollups average only rows committed by earlier calls; the triggering
    /// sample is appended after the averages are computed, so it never
    /// contributes to the windows it closes.
    pub fn process_datapoint(&mut self, value: f64, utc_timestamp: i64) -> Result<(), StoreError> {
        let mut batch = Vec::with_capacity(4);

        for bucket in [BucketDuration::Minute, BucketDuration::Hour] {
            if utc_timestamp % bucket.secs() == 0 {
                let window_start = utc_timestamp - bucket.secs();
                if let Some(avg) = self.store.average_raw(window_start, utc_timestamp)? {
                    batch.push(Measurement {
                        timestamp: utc_timestamp,
                        bucket,
                        value: avg,
                    });
                }
            }
        }

        // Day boundaries follow the local calendar, not timestamp % 86400:
        // epoch-aligned days only coincide with local days under UTC itself.
        let local = Self::local_datetime(&self.tz, utc_timestamp);
        let mut rolled_over = None;
        if local.date() != self.day_start.date() {
            let new_day_start = local.date().and_time(NaiveTime::MIN);
            // Both midnights are reinterpreted as UTC instants, matching the
            // window convention the rows were stored under. The upper bound
            // comes from the triggering sample, not the wall clock, so a
            // lagging process cannot shift the day window.
            let window_start = self.day_start.and_utc().timestamp();
            let window_end = new_day_start.and_utc().timestamp();
            if let Some(avg) = self.store.average_raw(window_start, window_end)? {
                batch.push(Measurement {
                    timestamp: utc_timestamp,
                    bucket: BucketDuration::Day,
                    value: avg,
                });
            }
            rolled_over = Some(new_day_start);
        }

        batch.push(Measurement {
            timestamp: utc_timestamp,
            bucket: BucketDuration::Raw,
            value,
        });

        self.store.insert_batch(&batch)?;

        // Advance only after the batch committed, so a failed write retries
        // the same rollover on the next sample.
        if let Some(new_day_start) = rolled_over {
            log::info!(
                "📅 Day rollover detected at {}: new day start {}",
                utc_timestamp,
                new_day_start
            );
            self.day_start = new_day_start;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use tempfile::tempdir;

    fn open_test_store() -> (tempfile::TempDir, MeasurementStore) {
        let dir = tempdir().unwrap();
        let store = MeasurementStore::open(dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn raw(timestamp: i64, value: f64) -> Measurement {
        Measurement {
            timestamp,
            bucket: BucketDuration::Raw,
            value,
        }
    }

    /// Engine pinned to UTC, seeded with one raw row so the day-start
    /// reference is deterministic (epoch day, not the test machine's today).
    fn utc_engine_seeded(
        mut store: MeasurementStore,
        seed: &[Measurement],
    ) -> AggregationEngine<Utc> {
        store.insert_batch(seed).unwrap();
        AggregationEngine::with_timezone(store, Utc).unwrap()
    }

    #[test]
    fn test_minute_rollup_is_mean_of_prior_window() {
        let (_dir, store) = open_test_store();
        let mut engine =
            utc_engine_seeded(store, &[raw(10, 10.0), raw(20, 20.0), raw(50, 60.0)]);

        engine.process_datapoint(100.0, 60).unwrap();

        let minutes = engine
            .store()
            .select_range(BucketDuration::Minute, 0, None)
            .unwrap();
        assert_eq!(minutes, vec![(60, 30.0)]);

        // The triggering sample itself never joins the window it closes
        let raws = engine
            .store()
            .select_range(BucketDuration::Raw, 60, None)
            .unwrap();
        assert_eq!(raws, vec![(60, 100.0)]);
    }

    #[test]
    fn test_no_rollup_off_minute_boundary() {
        let (_dir, store) = open_test_store();
        let mut engine = utc_engine_seeded(store, &[raw(10, 10.0)]);

        engine.process_datapoint(20.0, 70).unwrap();

        let minutes = engine
            .store()
            .select_range(BucketDuration::Minute, 0, None)
            .unwrap();
        assert!(minutes.is_empty());
    }

    #[test]
    fn test_empty_window_suppresses_rollup() {
        let (_dir, store) = open_test_store();
        // Seed far before the minute window so the average is over nothing
        let mut engine = utc_engine_seeded(store, &[raw(5, 1.0)]);

        engine.process_datapoint(42.0, 120).unwrap();

        let minutes = engine
            .store()
            .select_range(BucketDuration::Minute, 0, None)
            .unwrap();
        assert!(minutes.is_empty(), "no placeholder row for an empty window");

        let raws = engine
            .store()
            .select_range(BucketDuration::Raw, 120, None)
            .unwrap();
        assert_eq!(raws, vec![(120, 42.0)]);
    }

    #[test]
    fn test_minute_and_hour_fire_together_on_hour_boundary() {
        let (_dir, store) = open_test_store();
        let mut engine = utc_engine_seeded(
            store,
            &[raw(100, 10.0), raw(3550, 30.0), raw(3590, 50.0)],
        );

        engine.process_datapoint(0.0, 3600).unwrap();

        let minutes = engine
            .store()
            .select_range(BucketDuration::Minute, 0, None)
            .unwrap();
        // Minute window [3540, 3600): rows at 3550 and 3590
        assert_eq!(minutes, vec![(3600, 40.0)]);

        let hours = engine
            .store()
            .select_range(BucketDuration::Hour, 0, None)
            .unwrap();
        // Hour window [0, 3600): all three seeds
        assert_eq!(hours, vec![(3600, 30.0)]);
    }

    #[test]
    fn test_replay_appends_without_dedup() {
        let (_dir, store) = open_test_store();
        let mut engine = utc_engine_seeded(store, &[raw(30, 10.0)]);

        engine.process_datapoint(50.0, 60).unwrap();
        engine.process_datapoint(50.0, 60).unwrap();

        let raws = engine
            .store()
            .select_range(BucketDuration::Raw, 60, None)
            .unwrap();
        assert_eq!(raws, vec![(60, 50.0), (60, 50.0)]);

        // Both calls see the same prior window ([0, 60) excludes ts=60),
        // so both insert an identical minute rollup
        let minutes = engine
            .store()
            .select_range(BucketDuration::Minute, 0, None)
            .unwrap();
        assert_eq!(minutes, vec![(60, 10.0), (60, 10.0)]);
    }

    #[test]
    fn test_day_rollover_fires_on_local_calendar_change() {
        let (_dir, store) = open_test_store();
        let tz = FixedOffset::east_opt(5 * 3600 + 1800).unwrap(); // +05:30

        // Seed on local day 1970-01-01 (utc 0 is 05:30 local)
        let mut store = store;
        store
            .insert_batch(&[raw(100, 10.0), raw(66_590, 30.0)])
            .unwrap();
        let mut engine = AggregationEngine::with_timezone(store, tz).unwrap();
        assert_eq!(engine.day_start().date().to_string(), "1970-01-01");

        // Local midnight of 1970-01-02 is utc 66600 under +05:30
        engine.process_datapoint(50.0, 66_600).unwrap();

        let days = engine
            .store()
            .select_range(BucketDuration::Day, 0, None)
            .unwrap();
        // Window is both midnights reinterpreted as UTC: [0, 86400)
        assert_eq!(days, vec![(66_600, 20.0)]);
        assert_eq!(engine.day_start().date().to_string(), "1970-01-02");
    }

    #[test]
    fn test_day_rollover_fires_once_per_transition() {
        let (_dir, store) = open_test_store();
        let tz = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();

        let mut store = store;
        store.insert_batch(&[raw(100, 10.0)]).unwrap();
        let mut engine = AggregationEngine::with_timezone(store, tz).unwrap();

        engine.process_datapoint(50.0, 66_600).unwrap();
        engine.process_datapoint(51.0, 66_610).unwrap();
        engine.process_datapoint(52.0, 66_620).unwrap();

        let days = engine
            .store()
            .select_range(BucketDuration::Day, 0, None)
            .unwrap();
        assert_eq!(days.len(), 1);
    }

    #[test]
    fn test_epoch_aligned_timestamp_same_local_day_no_rollup() {
        let (_dir, store) = open_test_store();
        let tz = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();

        // Seed on local day 1970-01-02 (utc 66600 is local midnight)
        let mut store = store;
        store.insert_batch(&[raw(66_600, 10.0)]).unwrap();
        let mut engine = AggregationEngine::with_timezone(store, tz).unwrap();
        assert_eq!(engine.day_start().date().to_string(), "1970-01-02");

        // 86400 is divisible by a day, but it is 05:30 on the same local day
        engine.process_datapoint(20.0, 86_400).unwrap();

        let days = engine
            .store()
            .select_range(BucketDuration::Day, 0, None)
            .unwrap();
        assert!(days.is_empty());
    }

    #[test]
    fn test_day_rollover_with_empty_day_inserts_nothing() {
        let (_dir, store) = open_test_store();
        let tz = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();

        // Day-start seeded from a raw row that lies outside the rollover's
        // averaging window [0, 86400)
        let mut store = store;
        store.insert_batch(&[raw(90_000, 10.0)]).unwrap();
        let mut engine = AggregationEngine::with_timezone(store, tz).unwrap();
        assert_eq!(engine.day_start().date().to_string(), "1970-01-02");

        // Local day 3 starts at utc 153000 under +05:30; the day-2 window
        // [86400, 172800) holds the seed row, so this transition rolls up
        engine.process_datapoint(20.0, 153_000).unwrap();
        let days = engine
            .store()
            .select_range(BucketDuration::Day, 0, None)
            .unwrap();
        assert_eq!(days, vec![(153_000, 10.0)]);

        // Local day 4 starts at utc 239400; the day-3 window [172800, 259200)
        // holds no raw rows (153000 predates it), so no placeholder appears
        engine.process_datapoint(30.0, 239_400).unwrap();
        let days = engine
            .store()
            .select_range(BucketDuration::Day, 0, None)
            .unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(engine.day_start().date().to_string(), "1970-01-04");
    }

    #[test]
    fn test_day_start_reconstructed_from_store() {
        let (_dir, mut store) = open_test_store();
        store.insert_batch(&[raw(90_000, 10.0)]).unwrap();

        let tz = FixedOffset::east_opt(0).unwrap();
        let engine = AggregationEngine::with_timezone(store, tz).unwrap();
        // utc 90000 is 1970-01-02 01:00, so the reference is that local midnight
        assert_eq!(engine.day_start().to_string(), "1970-01-02 00:00:00");
    }
}
