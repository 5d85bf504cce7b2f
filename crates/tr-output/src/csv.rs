//! CSV output backend.
//!
//! Creates `purchase_log.csv` in the configured output directory.  Absent
//! `success` / `error` values are written as empty fields.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::LogWriter;
use crate::{LogEntry, OutputResult};

pub const CSV_HEADER: [&str; 10] = [
    "seq", "timestamp", "worker", "buyer", "gate", "quantity", "elapsed_ms", "success", "error",
    "retry",
];

/// Writes the purchase log to one CSV file.
pub struct CsvLogWriter {
    log:      Writer<File>,
    finished: bool,
}

impl CsvLogWriter {
    /// Create `purchase_log.csv` in `dir` and write the header row.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut log = Writer::from_path(dir.join("purchase_log.csv"))?;
        log.write_record(CSV_HEADER)?;
        Ok(Self { log, finished: false })
    }
}

impl LogWriter for CsvLogWriter {
    fn write_entry(&mut self, e: &LogEntry) -> OutputResult<()> {
        self.log.write_record(&[
            e.seq.to_string(),
            e.timestamp.to_rfc3339(),
            e.worker.0.to_string(),
            e.buyer.to_string(),
            e.gate.0.to_string(),
            e.quantity.to_string(),
            e.elapsed_ms.to_string(),
            e.success.map(|s| (s as u8).to_string()).unwrap_or_default(),
            e.error.clone().unwrap_or_default(),
            e.retry.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.log.flush()?;
        Ok(())
    }
}
