//! `tr-output` — purchase-attempt logging for the ticket_rush simulator.
//!
//! Three file backends are provided behind Cargo features:
//!
//! | Feature   | Backend     | File created              |
//! |-----------|-------------|---------------------------|
//! | *(none)*  | CSV         | `purchase_log.csv`        |
//! | `sqlite`  | SQLite      | `purchase_log.db`         |
//! | `parquet` | Parquet     | `purchase_log.parquet`    |
//!
//! All backends implement [`LogWriter`] and are shared between worker
//! threads through [`SharedSink`], which implements [`LogSink`].
//! [`MemorySink`] keeps entries in memory and [`SummarySink`] folds them into
//! a [`RunSummary`] on the way through.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tr_output::{CsvLogWriter, SharedSink};
//!
//! let sink = Arc::new(SharedSink::new(CsvLogWriter::new(Path::new("./out"))?));
//! // … hand `sink.clone()` to every buyer agent, run the pool …
//! sink.finish()?;
//! if let Some(e) = sink.take_error() { eprintln!("log error: {e}"); }
//! ```

pub mod csv;
pub mod error;
pub mod row;
pub mod sink;
pub mod summary;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;

#[cfg(test)]
mod tests;

pub use csv::CsvLogWriter;
pub use error::{OutputError, OutputResult};
pub use row::LogEntry;
pub use sink::{LogSink, MemorySink, SharedSink};
pub use summary::{RunSummary, SummarySink};
pub use writer::LogWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLogWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetLogWriter;
