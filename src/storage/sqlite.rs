//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::Answer;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{AnswerRecord, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Failed),
        question_count: row.get(5)?,
        answered_count: row.get(6)?,
    })
}

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, status, question_count, answered_count";

impl Storage for SqliteStorage {
    // ===== Content Cache =====

    fn get_cached(&self, url: &str) -> StorageResult<Option<String>> {
        let content = self
            .conn
            .query_row(
                "SELECT content FROM pages WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(content)
    }

    fn put_cached(&mut self, url: &str, text: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR IGNORE INTO pages (url, content, fetched_at) VALUES (?1, ?2, ?3)",
            params![url, text, now],
        )?;
        Ok(())
    }

    fn count_cached(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn clear_cache(&mut self) -> StorageResult<u64> {
        let removed = self.conn.execute("DELETE FROM pages", [])?;
        Ok(removed as u64)
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, question_count: u32) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status, question_count) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, RunStatus::Running.to_db_string(), question_count],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64, answered: u32) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, answered_count = ?3 WHERE id = ?4",
            params![RunStatus::Completed.to_db_string(), now, answered, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn count_runs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Answers =====

    fn record_answer(&mut self, run_id: i64, answer: &Answer) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO answers (run_id, question_id, answer, source, tier, obtained_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                answer.question_id,
                answer.text,
                answer.source.to_string(),
                answer.tier.to_db_string(),
                answer.obtained_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn get_answers(&self, run_id: i64) -> StorageResult<Vec<AnswerRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, question_id, answer, source, tier, obtained_at
             FROM answers WHERE run_id = ?1 ORDER BY question_id",
        )?;

        let answers = stmt
            .query_map(params![run_id], |row| {
                Ok(AnswerRecord {
                    run_id: row.get(0)?,
                    question_id: row.get(1)?,
                    answer: row.get(2)?,
                    source: row.get(3)?,
                    tier: row.get(4)?,
                    obtained_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(answers)
    }
}
