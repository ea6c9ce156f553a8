//! Shared SQLite PRAGMA tuning applied by every connection in the system.

use rusqlite::Connection;

/// Apply optimized PRAGMAs (WAL, NORMAL, MEMORY, mmap, cache, autocheckpoint).
///
/// WAL is what lets the query API read concurrently with the single writer:
/// readers see either the pre- or post-commit state of a batch, never a
/// partial one.
pub fn apply_optimized_pragmas(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA temp_store = MEMORY;
         PRAGMA mmap_size = 268435456;
         PRAGMA cache_size = -65536;
         PRAGMA wal_autocheckpoint = 1000;",
    )
}
