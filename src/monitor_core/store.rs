//! SQLite-backed measurement store.
//!
//! One append-only table holds both raw samples and rollup rows, keyed by
//! bucket duration. The `(bucket_duration, timestamp DESC)` index serves the
//! range averages and the "latest" lookup.

use super::bucket::BucketDuration;
use crate::sqlite_pragma::apply_optimized_pragmas;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    Io(std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// A measurement row pending insertion. The surrogate `id` is assigned by
/// SQLite and gives the canonical insertion order for range scans.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub timestamp: i64,
    pub bucket: BucketDuration,
    pub value: f64,
}

pub struct MeasurementStore {
    conn: Connection,
}

impl MeasurementStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;

        // Apply optimized PRAGMAs (WAL, NORMAL, MEMORY, mmap, cache, autocheckpoint)
        apply_optimized_pragmas(&conn)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS measurements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                bucket_duration INTEGER NOT NULL,
                value REAL NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_bucket_timestamp
             ON measurements(bucket_duration, timestamp DESC)",
            [],
        )?;

        log::info!("✅ SQLite measurement store initialized with WAL mode");

        Ok(Self { conn })
    }

    /// Insert a batch of rows inside one transaction. Readers never observe
    /// a partial batch; on error nothing is committed.
    pub fn insert_batch(&mut self, rows: &[Measurement]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;

        for row in rows {
            tx.execute(
                "INSERT INTO measurements (timestamp, bucket_duration, value)
                 VALUES (?1, ?2, ?3)",
                params![row.timestamp, row.bucket.secs(), row.value],
            )?;
        }

        tx.commit()?;

        log::debug!("✅ Committed batch of {} measurements", rows.len());

        Ok(())
    }

    /// Average of RAW rows with timestamp in `[start, end)`, or `None` when
    /// the range holds no rows.
    pub fn average_raw(&self, start: i64, end: i64) -> Result<Option<f64>, StoreError> {
        let avg = self.conn.query_row(
            "SELECT AVG(value) FROM measurements
             WHERE bucket_duration = ?1 AND timestamp >= ?2 AND timestamp < ?3",
            params![BucketDuration::Raw.secs(), start, end],
            |row| row.get::<_, Option<f64>>(0),
        )?;
        Ok(avg)
    }

    /// Rows of the given granularity with `timestamp >= start` (and
    /// `timestamp < end` when bounded), in insertion order.
    pub fn select_range(
        &self,
        bucket: BucketDuration,
        start: i64,
        end: Option<i64>,
    ) -> Result<Vec<(i64, f64)>, StoreError> {
        let mut rows = Vec::new();

        match end {
            Some(end) => {
                let mut stmt = self.conn.prepare(
                    "SELECT timestamp, value FROM measurements
                     WHERE bucket_duration = ?1 AND timestamp >= ?2 AND timestamp < ?3
                     ORDER BY id ASC",
                )?;
                let iter = stmt.query_map(params![bucket.secs(), start, end], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
                for row in iter {
                    rows.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT timestamp, value FROM measurements
                     WHERE bucket_duration = ?1 AND timestamp >= ?2
                     ORDER BY id ASC",
                )?;
                let iter = stmt.query_map(params![bucket.secs(), start], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
                for row in iter {
                    rows.push(row?);
                }
            }
        }

        Ok(rows)
    }

    /// Most recently inserted RAW row, by insertion order.
    pub fn latest_raw(&self) -> Result<Option<(i64, f64)>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT timestamp, value FROM measurements
                 WHERE bucket_duration = ?1 ORDER BY id DESC LIMIT 1",
                params![BucketDuration::Raw.secs()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    /// Timestamp of the most recently inserted row of any granularity. Used
    /// to reconstruct the engine's day-start reference at startup.
    pub fn last_timestamp(&self) -> Result<Option<i64>, StoreError> {
        let ts = self
            .conn
            .query_row(
                "SELECT timestamp FROM measurements ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ts)
    }
}
