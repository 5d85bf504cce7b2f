//! SQLite output backend (feature `sqlite`).
//!
//! Creates `purchase_log.db` in the configured output directory with one
//! table, `purchase_log`.  `is_success` and `exception` are `NULL` when the
//! attempt faulted / had no error respectively.
//!
//! Rows are buffered and inserted [`BATCH_ROWS`] at a time inside one
//! transaction, so the sink's lock is not held across a commit per attempt.
//! `finish()` flushes the remainder.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::LogWriter;
use crate::{LogEntry, OutputResult};

/// Longest error message stored; longer messages are cut at a char boundary.
pub const MAX_EXCEPTION_CHARS: usize = 250;

/// Rows per insert transaction.
pub const BATCH_ROWS: usize = 1_024;

/// Writes the purchase log to an SQLite database.
pub struct SqliteLogWriter {
    conn:     Connection,
    pending:  Vec<LogEntry>,
    finished: bool,
}

impl SqliteLogWriter {
    /// Open (or create) `purchase_log.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("purchase_log.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS purchase_log (
                 no            INTEGER PRIMARY KEY,
                 event_time    TEXT    NOT NULL,
                 worker        INTEGER NOT NULL,
                 member_guid   TEXT    NOT NULL,
                 gate_no       INTEGER NOT NULL,
                 ticket_number INTEGER NOT NULL,
                 elapsed       INTEGER NOT NULL,
                 is_success    INTEGER,
                 exception     TEXT,
                 retry         INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, pending: Vec::with_capacity(BATCH_ROWS), finished: false })
    }

    /// Rows buffered but not yet committed.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn flush_pending(&mut self) -> OutputResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO purchase_log \
                 (no, event_time, worker, member_guid, gate_no, ticket_number, elapsed, \
                  is_success, exception, retry) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for e in &self.pending {
                let exception = e
                    .error
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| truncate_chars(s, MAX_EXCEPTION_CHARS));
                stmt.execute(rusqlite::params![
                    e.seq,
                    e.timestamp.to_rfc3339(),
                    e.worker.0,
                    e.buyer.to_string(),
                    e.gate.0,
                    e.quantity,
                    e.elapsed_ms,
                    e.success,
                    exception,
                    e.retry,
                ])?;
            }
        }
        tx.commit()?;
        self.pending.clear();
        Ok(())
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

impl LogWriter for SqliteLogWriter {
    fn write_entry(&mut self, e: &LogEntry) -> OutputResult<()> {
        self.pending.push(e.clone());
        if self.pending.len() >= BATCH_ROWS {
            self.flush_pending()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.flush_pending()?;
        self.finished = true;
        self.conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
