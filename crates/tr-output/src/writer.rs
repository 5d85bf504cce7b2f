//! The `LogWriter` trait implemented by all backend writers.

use crate::{LogEntry, OutputResult};

/// Trait implemented by CSV, SQLite, and Parquet writers.
///
/// Writers are single-threaded; [`SharedSink`](crate::SharedSink) serializes
/// appends from concurrent workers and keeps write errors away from them.
pub trait LogWriter: Send {
    /// Write one sequenced entry.
    fn write_entry(&mut self, entry: &LogEntry) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
