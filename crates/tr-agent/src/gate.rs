//! Start gate and stop signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// How a [`StartGate::wait`] call ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GateOutcome {
    Opened,
    Stopped,
}

/// Process-wide latch that holds every buyer until the sale opens.
///
/// Closed at construction; [`open`](Self::open) releases all current and
/// future waiters at once and is idempotent.  There is no way to close it
/// again.
///
/// Waiters block on a condition variable and re-check on a bounded interval
/// so they also notice a [`StopSignal`] without a dedicated wake-up.
pub struct StartGate {
    opened: AtomicBool,
    lock:   Mutex<bool>,
    cvar:   Condvar,
    poll:   Duration,
}

impl StartGate {
    pub fn new(poll: Duration) -> Self {
        Self {
            opened: AtomicBool::new(false),
            lock:   Mutex::new(false),
            cvar:   Condvar::new(),
            poll,
        }
    }

    /// Open the gate.  Returns `true` only for the call that opened it.
    pub fn open(&self) -> bool {
        let mut open = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        if *open {
            return false;
        }
        *open = true;
        self.opened.store(true, Ordering::Release);
        self.cvar.notify_all();
        true
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }

    /// Block until the gate opens or `stop` fires.
    ///
    /// Returns immediately once the gate is open.
    pub fn wait(&self, stop: &StopSignal) -> GateOutcome {
        if self.is_open() {
            return GateOutcome::Opened;
        }
        let mut open = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        while !*open {
            if stop.is_stopped() {
                return GateOutcome::Stopped;
            }
            open = match self.cvar.wait_timeout(open, self.poll) {
                Ok((guard, _)) => guard,
                Err(p) => p.into_inner().0,
            };
        }
        GateOutcome::Opened
    }
}

/// Cooperative cancellation flag shared by a pool and its agents.
///
/// Agents check it while waiting at the gate and at the top of every loop
/// iteration.  A call already in flight against the datastore is never
/// interrupted.
#[derive(Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
