//! SQLite schema definitions

use rusqlite::Connection;

/// Live status, one row per scan
pub const CREATE_SCANS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS scans (
    job_id        TEXT PRIMARY KEY,
    status        TEXT NOT NULL,
    progress      INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    pages_crawled INTEGER,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
)";

/// Individual analyzer outcomes and the final aggregate
pub const CREATE_SCAN_RESULTS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS scan_results (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id      TEXT NOT NULL,
    result_type TEXT NOT NULL,
    page_url    TEXT,
    data        TEXT NOT NULL,
    created_at  TEXT NOT NULL
)";

pub const CREATE_SCAN_RESULTS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_scan_results_job ON scan_results (job_id)";

/// Creates all tables and indexes if they don't exist
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(CREATE_SCANS_TABLE, [])?;
    conn.execute(CREATE_SCAN_RESULTS_TABLE, [])?;
    conn.execute(CREATE_SCAN_RESULTS_INDEX, [])?;
    Ok(())
}
