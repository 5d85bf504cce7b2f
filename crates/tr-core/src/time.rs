//! Wall-clock timing helpers.
//!
//! Latency is the quantity under measurement, so it is taken from a monotonic
//! `Instant`, never from the system clock.  Log timestamps (wall time) are a
//! separate concern handled by the output crate.

use std::time::{Duration, Instant};

/// A started monotonic timer.
///
/// `Stopwatch` is `Copy`; reading it does not stop it.
#[derive(Copy, Clone, Debug)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    /// Start timing now.
    #[inline]
    pub fn start() -> Self {
        Self { started: Instant::now() }
    }

    /// Time since [`start`](Self::start).
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
#[inline]
pub fn as_millis_u64(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Build a `Duration` from a millisecond count read from config.
#[inline]
pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
