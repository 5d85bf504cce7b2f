//! `LogSink`: where buyer agents send their log entries.
//!
//! Appending is fire-and-forget: a sink never hands an error back to the
//! agent, because a logging failure must not break the purchase loop.
//! Backends that can fail keep the first error for the caller to collect
//! after the run via [`SharedSink::take_error`].

use std::sync::{Arc, Mutex, MutexGuard};

use crate::writer::LogWriter;
use crate::{LogEntry, OutputError, OutputResult};

/// A destination for purchase-attempt log entries.
///
/// Called concurrently from every worker thread.
pub trait LogSink: Send + Sync + 'static {
    /// Record one attempt.  The sink assigns `entry.seq`.
    fn append(&self, entry: LogEntry);
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn append(&self, entry: LogEntry) {
        (**self).append(entry)
    }
}

// ── SharedSink ────────────────────────────────────────────────────────────────

struct SinkState<W> {
    writer:     W,
    next_seq:   u64,
    last_error: Option<OutputError>,
}

/// A thread-safe [`LogSink`] over any [`LogWriter`] backend.
///
/// Appends are serialized by a mutex; sequence numbers are handed out under
/// the same lock so they match file order.  Errors from the writer are
/// stored rather than returned.  After the pool finishes, call
/// [`finish`][Self::finish] and check [`take_error`][Self::take_error].
pub struct SharedSink<W: LogWriter> {
    state: Mutex<SinkState<W>>,
}

impl<W: LogWriter> SharedSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            state: Mutex::new(SinkState { writer, next_seq: 1, last_error: None }),
        }
    }

    /// Number of entries appended so far (including any that failed to write).
    pub fn appended(&self) -> u64 {
        self.lock().next_seq - 1
    }

    /// Flush the underlying writer.
    pub fn finish(&self) -> OutputResult<()> {
        self.lock().writer.finish()
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&self) -> Option<OutputError> {
        self.lock().last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.state.into_inner().unwrap_or_else(|p| p.into_inner()).writer
    }

    /// A poisoned lock only means another worker panicked mid-append; the
    /// writer itself is still usable.
    fn lock(&self) -> MutexGuard<'_, SinkState<W>> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl<W: LogWriter + 'static> LogSink for SharedSink<W> {
    fn append(&self, mut entry: LogEntry) {
        let mut state = self.lock();
        entry.seq = state.next_seq;
        state.next_seq += 1;
        if let Err(e) = state.writer.write_entry(&entry) {
            tracing::warn!(seq = entry.seq, error = %e, "purchase log write failed");
            // Keep only the first error.
            if state.last_error.is_none() {
                state.last_error = Some(e);
            }
        }
    }
}

// ── MemorySink ────────────────────────────────────────────────────────────────

/// A [`LogSink`] that keeps every entry in memory.
///
/// Useful in tests and for short runs that only need a [`RunSummary`].
///
/// [`RunSummary`]: crate::RunSummary
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every entry appended so far, in sequence order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl LogSink for MemorySink {
    fn append(&self, mut entry: LogEntry) {
        let mut entries = self.lock();
        entry.seq = entries.len() as u64 + 1;
        entries.push(entry);
    }
}
