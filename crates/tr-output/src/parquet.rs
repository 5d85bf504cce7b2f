//! Parquet output backend (feature `parquet`).
//!
//! Creates `purchase_log.parquet` in the configured output directory.  Rows
//! are buffered and written as one record batch per [`BATCH_ROWS`] entries.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    BooleanBuilder, Int64Builder, StringBuilder, UInt8Builder, UInt32Builder, UInt64Builder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::LogWriter;
use crate::{LogEntry, OutputResult};

pub const BATCH_ROWS: usize = 4_096;

fn log_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("seq",          DataType::UInt64,  false),
        Field::new("timestamp_ms", DataType::Int64,   false),
        Field::new("worker",       DataType::UInt32,  false),
        Field::new("buyer",        DataType::Utf8,    false),
        Field::new("gate",         DataType::UInt32,  false),
        Field::new("quantity",     DataType::UInt8,   false),
        Field::new("elapsed_ms",   DataType::UInt64,  false),
        Field::new("success",      DataType::Boolean, true),
        Field::new("error",        DataType::Utf8,    true),
        Field::new("retry",        DataType::UInt32,  false),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// Writes the purchase log to a Parquet file.
///
/// `finish()` **must** be called to flush the last batch and write the file
/// footer; files written without it cannot be opened by Parquet readers.
pub struct ParquetLogWriter {
    writer:  Option<ArrowWriter<File>>,
    schema:  Arc<Schema>,
    pending: Vec<LogEntry>,
}

impl ParquetLogWriter {
    /// Create `purchase_log.parquet` in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let schema = log_schema();
        let file = File::create(dir.join("purchase_log.parquet"))?;
        let writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(snappy_props()))?;
        Ok(Self {
            writer: Some(writer),
            schema,
            pending: Vec::with_capacity(BATCH_ROWS),
        })
    }

    fn flush_pending(&mut self) -> OutputResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        let mut seqs       = UInt64Builder::new();
        let mut timestamps = Int64Builder::new();
        let mut workers    = UInt32Builder::new();
        let mut buyers     = StringBuilder::new();
        let mut gates      = UInt32Builder::new();
        let mut quantities = UInt8Builder::new();
        let mut elapsed    = UInt64Builder::new();
        let mut successes  = BooleanBuilder::new();
        let mut errors     = StringBuilder::new();
        let mut retries    = UInt32Builder::new();

        for e in self.pending.drain(..) {
            seqs.append_value(e.seq);
            timestamps.append_value(e.timestamp.timestamp_millis());
            workers.append_value(e.worker.0);
            buyers.append_value(e.buyer.to_string());
            gates.append_value(e.gate.0);
            quantities.append_value(e.quantity);
            elapsed.append_value(e.elapsed_ms);
            successes.append_option(e.success);
            errors.append_option(e.error.as_deref());
            retries.append_value(e.retry);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.schema),
            vec![
                Arc::new(seqs.finish()),
                Arc::new(timestamps.finish()),
                Arc::new(workers.finish()),
                Arc::new(buyers.finish()),
                Arc::new(gates.finish()),
                Arc::new(quantities.finish()),
                Arc::new(elapsed.finish()),
                Arc::new(successes.finish()),
                Arc::new(errors.finish()),
                Arc::new(retries.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }
}

impl LogWriter for ParquetLogWriter {
    fn write_entry(&mut self, entry: &LogEntry) -> OutputResult<()> {
        self.pending.push(entry.clone());
        if self.pending.len() >= BATCH_ROWS {
            self.flush_pending()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.flush_pending()?;
        if let Some(w) = self.writer.take() {
            w.close()?;
        }
        Ok(())
    }
}
