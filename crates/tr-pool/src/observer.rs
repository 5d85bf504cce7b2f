//! Pool observer trait for progress reporting.

use std::time::Duration;

use tr_agent::StatusBoard;

use crate::PoolReport;

/// Callbacks invoked while a [`WorkerPool`](crate::WorkerPool) is being
/// waited on.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct Progress { polls: u64 }
///
/// impl PoolObserver for Progress {
///     fn on_poll(&mut self, board: &StatusBoard) {
///         self.polls += 1;
///         if self.polls % 100 == 0 {
///             eprintln!("{} workers still buying", board.active().len());
///         }
///     }
/// }
/// ```
pub trait PoolObserver {
    /// Called once per monitor poll, before the board is scanned.
    ///
    /// Read-only access to the board lets an observer sample the state
    /// distribution without the pool knowing what is being recorded.
    fn on_poll(&mut self, _board: &StatusBoard) {}

    /// Called when a scan first finds every worker terminal, before the
    /// settle delay.
    fn on_settling(&mut self, _elapsed: Duration) {}

    /// Called once after every worker thread has been joined.
    fn on_complete(&mut self, _report: &PoolReport) {}
}

/// A [`PoolObserver`] that does nothing.
pub struct NoopObserver;

impl PoolObserver for NoopObserver {}
