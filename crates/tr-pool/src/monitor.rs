//! Completion detection over the status board.

use std::thread;
use std::time::{Duration, Instant};

use tr_agent::StatusBoard;
use tr_core::{LoaderConfig, Stopwatch, WorkerId};

use crate::PoolObserver;

/// Polls a [`StatusBoard`] until every slot is terminal.
///
/// Each poll is a two-phase check: assume done, scan every slot, and drop the
/// assumption at the first active worker.  A clean scan is followed by the
/// settle delay and a second scan; only if that also comes back clean is the
/// run complete.  Detection latency is therefore at most one poll interval
/// plus the settle delay.
#[derive(Copy, Clone, Debug)]
pub struct CompletionMonitor {
    poll:   Duration,
    settle: Duration,
}

impl CompletionMonitor {
    pub fn new(poll: Duration, settle: Duration) -> Self {
        Self { poll, settle }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(config.monitor_poll(), config.settle())
    }

    /// One scan.  `true` if no worker is active.
    pub fn all_terminal(board: &StatusBoard) -> bool {
        let mut done = true;
        for i in 0..board.len() {
            if !board.state(WorkerId(i as u32)).is_terminal() {
                done = false;
                break;
            }
        }
        done
    }

    /// Block until every worker is terminal.  Never returns otherwise.
    pub fn wait(&self, board: &StatusBoard, obs: &mut dyn PoolObserver) {
        // With no deadline the only exit is Ok.
        let _ = self.wait_until(board, None, obs);
    }

    /// Block until every worker is terminal or `deadline` passes.
    ///
    /// On timeout returns the workers still active at that moment.
    pub fn wait_until(
        &self,
        board:    &StatusBoard,
        deadline: Option<Instant>,
        obs:      &mut dyn PoolObserver,
    ) -> Result<(), Vec<WorkerId>> {
        let sw = Stopwatch::start();
        loop {
            obs.on_poll(board);
            if Self::all_terminal(board) {
                obs.on_settling(sw.elapsed());
                thread::sleep(self.settle);
                if Self::all_terminal(board) {
                    return Ok(());
                }
            }

            let nap = match deadline {
                Some(d) => {
                    let now = Instant::now();
                    if now >= d {
                        return Err(board.active());
                    }
                    self.poll.min(d - now)
                }
                None => self.poll,
            };
            thread::sleep(nap);
        }
    }
}
