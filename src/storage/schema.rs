//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Prospector database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Persistent content cache, keyed by the literal URL string
CREATE TABLE IF NOT EXISTS pages (
    url TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);

-- Track agent runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    question_count INTEGER NOT NULL DEFAULT 0,
    answered_count INTEGER NOT NULL DEFAULT 0
);

-- Final answers of each run
CREATE TABLE IF NOT EXISTS answers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    question_id TEXT NOT NULL,
    answer TEXT NOT NULL,
    source TEXT NOT NULL,
    tier TEXT NOT NULL,
    obtained_at TEXT NOT NULL,
    UNIQUE(run_id, question_id)
);

CREATE INDEX IF NOT EXISTS idx_answers_run ON answers(run_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
