//! Run configuration.
//!
//! # Design
//!
//! `LoaderConfig` is a plain value: it is built once by the application
//! (defaults, then a TOML file, then CLI flags) and copied into every agent
//! at construction.  Nothing reads a process-global "current event"; the
//! event id travels with the config.
//!
//! The intervals default to the reference load profile:
//!
//! | Field               | Default | Used by                               |
//! |---------------------|---------|---------------------------------------|
//! | `gate_poll_ms`      | 50      | `StartGate::wait` re-check interval   |
//! | `monitor_poll_ms`   | 10      | completion monitor scan interval      |
//! | `settle_ms`         | 100     | settle delay after "all terminal"     |
//! | `read_retry_ms`     | 50      | pause before re-reading after a fault |

use std::time::Duration;

use crate::time::millis;
use crate::{CoreError, CoreResult, EventId};

// ── FaultPolicy ───────────────────────────────────────────────────────────────

/// What a worker does after repeated errored purchase attempts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FaultPolicy {
    /// Retry immediately, forever.  This is the load profile under test.
    #[default]
    Unlimited,
    /// Halt the worker after this many consecutive errored attempts.
    TripAfter(u32),
}

// ── LoaderConfig ──────────────────────────────────────────────────────────────

/// Top-level configuration for one contention run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoaderConfig {
    /// Event every worker buys tickets for.
    pub event: EventId,

    /// Number of concurrent buyer workers (one OS thread each).
    pub workers: usize,

    /// Master RNG seed.  `None` draws fresh entropy per run.
    pub seed: Option<u64>,

    pub gate_poll_ms: u64,
    pub monitor_poll_ms: u64,
    pub settle_ms: u64,
    pub read_retry_ms: u64,

    /// Behavior after consecutive errored attempts.
    pub fault_policy: FaultPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            event:           EventId(1),
            workers:         10_000,
            seed:            None,
            gate_poll_ms:    50,
            monitor_poll_ms: 10,
            settle_ms:       100,
            read_retry_ms:   50,
            fault_policy:    FaultPolicy::Unlimited,
        }
    }
}

impl LoaderConfig {
    /// Reject configurations that cannot run.
    pub fn validate(&self) -> CoreResult<()> {
        if self.workers == 0 {
            return Err(CoreError::Config("workers must be at least 1".into()));
        }
        if u32::try_from(self.workers).is_err() {
            return Err(CoreError::Config(format!(
                "workers = {} exceeds the WorkerId range",
                self.workers
            )));
        }
        if self.gate_poll_ms == 0 || self.monitor_poll_ms == 0 {
            return Err(CoreError::Config(
                "gate_poll_ms and monitor_poll_ms must be non-zero".into(),
            ));
        }
        if self.fault_policy == FaultPolicy::TripAfter(0) {
            return Err(CoreError::Config("fault_policy trip_after must be at least 1".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn gate_poll(&self) -> Duration {
        millis(self.gate_poll_ms)
    }

    #[inline]
    pub fn monitor_poll(&self) -> Duration {
        millis(self.monitor_poll_ms)
    }

    #[inline]
    pub fn settle(&self) -> Duration {
        millis(self.settle_ms)
    }

    #[inline]
    pub fn read_retry(&self) -> Duration {
        millis(self.read_retry_ms)
    }
}
