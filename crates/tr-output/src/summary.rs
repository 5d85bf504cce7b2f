//! Run-level success rate and latency summary.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::{LogEntry, LogSink};

/// Aggregate outcome of a contention run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub attempts:   u64,
    pub successes:  u64,
    pub declines:   u64,
    pub errors:     u64,
    /// Tickets sold, i.e. the sum of `quantity` over successful attempts.
    pub units_sold: u64,
    /// Latency of the datastore write, over all attempts.  `None` when there
    /// were no attempts.
    pub min_ms:     Option<u64>,
    pub p50_ms:     Option<u64>,
    pub p95_ms:     Option<u64>,
    pub max_ms:     Option<u64>,
}

impl RunSummary {
    /// Summarise a slice of log entries.
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        let mut acc = Accumulator::default();
        for e in entries {
            acc.record(e);
        }
        acc.summary()
    }

    /// Successful attempts as a fraction of all attempts (`0.0` when idle).
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = |v: Option<u64>| v.map_or_else(|| "-".to_owned(), |v| format!("{v} ms"));
        writeln!(
            f,
            "attempts {}  |  sold {} ({} units)  |  declined {}  |  errors {}",
            self.attempts, self.successes, self.units_sold, self.declines, self.errors
        )?;
        write!(
            f,
            "success rate {:.2}%  |  latency min {}  p50 {}  p95 {}  max {}",
            self.success_rate() * 100.0,
            ms(self.min_ms),
            ms(self.p50_ms),
            ms(self.p95_ms),
            ms(self.max_ms),
        )
    }
}

// ── Accumulator ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Accumulator {
    summary:   RunSummary,
    latencies: Vec<u64>,
}

impl Accumulator {
    fn record(&mut self, e: &LogEntry) {
        let s = &mut self.summary;
        s.attempts += 1;
        match e.success {
            Some(true) => {
                s.successes += 1;
                s.units_sold += u64::from(e.quantity);
            }
            Some(false) => s.declines += 1,
            None => s.errors += 1,
        }
        self.latencies.push(e.elapsed_ms);
    }

    fn summary(&self) -> RunSummary {
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        RunSummary {
            min_ms: sorted.first().copied(),
            p50_ms: percentile(&sorted, 50),
            p95_ms: percentile(&sorted, 95),
            max_ms: sorted.last().copied(),
            ..self.summary.clone()
        }
    }
}

/// Nearest-rank percentile of an ascending slice.
fn percentile(sorted: &[u64], pct: usize) -> Option<u64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (pct * sorted.len()).div_ceil(100).max(1);
    sorted.get(rank - 1).copied()
}

// ── SummarySink ───────────────────────────────────────────────────────────────

/// A [`LogSink`] that folds every entry into a [`RunSummary`] and then
/// forwards it to `inner`.
pub struct SummarySink<S: LogSink> {
    inner: S,
    acc:   Mutex<Accumulator>,
}

impl<S: LogSink> SummarySink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, acc: Mutex::new(Accumulator::default()) }
    }

    /// Summary of everything appended so far.
    pub fn summary(&self) -> RunSummary {
        self.lock().summary()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn lock(&self) -> MutexGuard<'_, Accumulator> {
        self.acc.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl<S: LogSink> LogSink for SummarySink<S> {
    fn append(&self, entry: LogEntry) {
        self.lock().record(&entry);
        self.inner.append(entry);
    }
}
