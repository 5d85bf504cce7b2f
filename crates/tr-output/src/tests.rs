//! Unit tests for tr-output.

#[cfg(test)]
fn entry(worker: u32, success: Option<bool>, elapsed_ms: u64) -> crate::LogEntry {
    use tr_core::{BuyerId, GateId, WorkerId};

    let error = match success {
        None => Some("connection reset".to_owned()),
        Some(_) => None,
    };
    crate::LogEntry::attempt(WorkerId(worker), BuyerId::fresh(), GateId(1), 2, elapsed_ms, success, error)
}

#[cfg(test)]
mod sink_tests {
    use std::sync::Arc;

    use super::entry;
    use crate::writer::LogWriter;
    use crate::{LogEntry, LogSink, MemorySink, OutputError, OutputResult, SharedSink};

    /// Writer that fails every write after the first `ok` writes.
    struct FailAfter {
        ok:      usize,
        written: Vec<u64>,
    }

    impl LogWriter for FailAfter {
        fn write_entry(&mut self, e: &LogEntry) -> OutputResult<()> {
            if self.written.len() >= self.ok {
                return Err(OutputError::Io(std::io::Error::other("disk full")));
            }
            self.written.push(e.seq);
            Ok(())
        }

        fn finish(&mut self) -> OutputResult<()> {
            Ok(())
        }
    }

    #[test]
    fn memory_sink_assigns_sequence() {
        let sink = MemorySink::new();
        sink.append(entry(0, Some(true), 3));
        sink.append(entry(1, Some(false), 4));
        let entries = sink.entries();
        assert_eq!(entries.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn shared_sink_keeps_first_error_and_continues() {
        let sink = SharedSink::new(FailAfter { ok: 1, written: vec![] });
        sink.append(entry(0, Some(true), 1));
        sink.append(entry(0, Some(true), 1));
        sink.append(entry(0, Some(true), 1));
        assert_eq!(sink.appended(), 3);
        let err = sink.take_error().expect("error retained");
        assert!(err.to_string().contains("disk full"));
        assert!(sink.take_error().is_none(), "error is taken once");
        assert_eq!(sink.into_writer().written, vec![1]);
    }

    #[test]
    fn shared_sink_sequences_are_unique_under_contention() {
        let sink = Arc::new(SharedSink::new(FailAfter { ok: usize::MAX, written: vec![] }));
        let handles: Vec<_> = (0..8)
            .map(|w| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        sink.append(entry(w, Some(false), 0));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let sink = Arc::into_inner(sink).expect("sole owner");
        let written = sink.into_writer().written;
        assert_eq!(written, (1..=800).collect::<Vec<u64>>());
    }

    #[test]
    fn retry_is_always_zero() {
        let e = entry(0, None, 9);
        assert_eq!(e.retry, 0);
        assert!(e.is_error());
    }
}

#[cfg(test)]
mod summary_tests {
    use super::entry;
    use crate::{LogSink, MemorySink, RunSummary, SummarySink};

    #[test]
    fn empty_summary() {
        let s = RunSummary::from_entries(&[]);
        assert_eq!(s.attempts, 0);
        assert_eq!(s.p50_ms, None);
        assert_eq!(s.success_rate(), 0.0);
    }

    #[test]
    fn counts_by_outcome() {
        let entries = vec![
            entry(0, Some(true), 10),
            entry(1, Some(true), 20),
            entry(2, Some(false), 30),
            entry(3, None, 40),
        ];
        let s = RunSummary::from_entries(&entries);
        assert_eq!(s.attempts, 4);
        assert_eq!(s.successes, 2);
        assert_eq!(s.declines, 1);
        assert_eq!(s.errors, 1);
        assert_eq!(s.units_sold, 4); // quantity 2 per success
        assert_eq!(s.min_ms, Some(10));
        assert_eq!(s.max_ms, Some(40));
        assert!((s.success_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn nearest_rank_percentiles() {
        let entries: Vec<_> = (1..=100).map(|ms| entry(0, Some(false), ms)).collect();
        let s = RunSummary::from_entries(&entries);
        assert_eq!(s.p50_ms, Some(50));
        assert_eq!(s.p95_ms, Some(95));
    }

    #[test]
    fn summary_sink_forwards_and_counts() {
        let sink = SummarySink::new(MemorySink::new());
        sink.append(entry(0, Some(true), 5));
        sink.append(entry(0, None, 7));
        assert_eq!(sink.inner().len(), 2);
        let s = sink.summary();
        assert_eq!(s.successes, 1);
        assert_eq!(s.errors, 1);
        assert_eq!(s, RunSummary::from_entries(&sink.inner().entries()));
    }

    #[test]
    fn display_mentions_rate() {
        let s = RunSummary::from_entries(&[entry(0, Some(true), 1)]);
        assert!(s.to_string().contains("success rate 100.00%"));
    }
}

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use super::entry;
    use crate::csv::{CSV_HEADER, CsvLogWriter};
    use crate::writer::LogWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn csv_header_correct() {
        let dir = tmp();
        let mut w = CsvLogWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("purchase_log.csv")).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, CSV_HEADER);
    }

    #[test]
    fn csv_null_fields_are_empty() {
        let dir = tmp();
        let mut w = CsvLogWriter::new(dir.path()).unwrap();
        let mut ok = entry(3, Some(true), 12);
        ok.seq = 1;
        let mut faulted = entry(4, None, 8);
        faulted.seq = 2;
        w.write_entry(&ok).unwrap();
        w.write_entry(&faulted).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("purchase_log.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "1");
        assert_eq!(&rows[0][2], "3");
        assert_eq!(&rows[0][7], "1");
        assert_eq!(&rows[0][8], "");
        assert_eq!(&rows[1][7], "");
        assert_eq!(&rows[1][8], "connection reset");
        assert_eq!(&rows[1][9], "0");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvLogWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

// ── SQLite tests ──────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use tempfile::TempDir;

    use super::entry;
    use crate::sqlite::{BATCH_ROWS, MAX_EXCEPTION_CHARS, SqliteLogWriter};
    use crate::writer::LogWriter;
    use crate::{LogSink, SharedSink};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteLogWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("purchase_log.db").exists());
    }

    #[test]
    fn sqlite_null_success_for_faults() {
        let dir = tmp();
        let sink = SharedSink::new(SqliteLogWriter::new(dir.path()).unwrap());
        sink.append(entry(0, None, 1));
        sink.append(entry(0, Some(false), 1));
        sink.finish().unwrap();
        assert!(sink.take_error().is_none());

        let conn = rusqlite::Connection::open(dir.path().join("purchase_log.db")).unwrap();
        let nulls: i64 = conn
            .query_row("SELECT COUNT(*) FROM purchase_log WHERE is_success IS NULL", [], |r| r.get(0))
            .unwrap();
        let declined_exception: Option<String> = conn
            .query_row("SELECT exception FROM purchase_log WHERE no = 2", [], |r| r.get(0))
            .unwrap();
        assert_eq!(nulls, 1);
        assert_eq!(declined_exception, None);
    }

    fn logged_rows(dir: &TempDir) -> i64 {
        let conn = rusqlite::Connection::open(dir.path().join("purchase_log.db")).unwrap();
        conn.query_row("SELECT COUNT(*) FROM purchase_log", [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn sqlite_rows_commit_in_batches() {
        let dir = tmp();
        let mut w = SqliteLogWriter::new(dir.path()).unwrap();
        for i in 0..BATCH_ROWS + 3 {
            let mut e = entry(0, Some(true), 1);
            e.seq = i as u64 + 1;
            w.write_entry(&e).unwrap();
        }
        assert_eq!(w.pending(), 3);
        assert_eq!(logged_rows(&dir), BATCH_ROWS as i64);

        w.finish().unwrap();
        assert_eq!(w.pending(), 0);
        assert_eq!(logged_rows(&dir), BATCH_ROWS as i64 + 3);
    }

    #[test]
    fn sqlite_exception_truncated() {
        let dir = tmp();
        let mut w = SqliteLogWriter::new(dir.path()).unwrap();
        let mut e = entry(0, None, 1);
        e.seq = 1;
        e.error = Some("x".repeat(1_000));
        w.write_entry(&e).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("purchase_log.db")).unwrap();
        let len: i64 = conn
            .query_row("SELECT LENGTH(exception) FROM purchase_log", [], |r| r.get(0))
            .unwrap();
        assert_eq!(len as usize, MAX_EXCEPTION_CHARS);
    }
}

#[cfg(all(test, feature = "parquet"))]
mod parquet_tests {
    use tempfile::TempDir;

    use super::entry;
    use crate::parquet::ParquetLogWriter;
    use crate::writer::LogWriter;

    #[test]
    fn parquet_file_has_footer_after_finish() {
        let dir: TempDir = tempfile::tempdir().expect("create temp dir");
        let mut w = ParquetLogWriter::new(dir.path()).unwrap();
        for seq in 1..=10 {
            let mut e = entry(0, if seq % 3 == 0 { None } else { Some(true) }, seq);
            e.seq = seq;
            w.write_entry(&e).unwrap();
        }
        w.finish().unwrap();
        w.finish().unwrap();

        let bytes = std::fs::read(dir.path().join("purchase_log.parquet")).unwrap();
        assert!(bytes.len() > 8);
        assert_eq!(&bytes[bytes.len() - 4..], b"PAR1");
    }
}
