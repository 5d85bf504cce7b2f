//! The log row written once per purchase attempt.

use chrono::{DateTime, Utc};

use tr_core::{BuyerId, GateId, WorkerId};

/// One purchase attempt, as recorded in the log.
///
/// `success` is tri-state:
///
/// | Value         | Meaning                                            |
/// |---------------|----------------------------------------------------|
/// | `Some(true)`  | the datastore sold the tickets                     |
/// | `Some(false)` | the datastore declined (e.g. the race was lost)    |
/// | `None`        | the attempt faulted; `error` holds the message     |
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Assigned by the sink on append; `0` until then.
    pub seq:        u64,
    pub timestamp:  DateTime<Utc>,
    pub worker:     WorkerId,
    pub buyer:      BuyerId,
    pub gate:       GateId,
    /// Tickets requested.
    pub quantity:   u8,
    /// Duration of the datastore write call.
    pub elapsed_ms: u64,
    pub success:    Option<bool>,
    pub error:      Option<String>,
    /// Reserved for a retry-with-backoff mode.  Always `0`.
    pub retry:      u32,
}

impl LogEntry {
    /// An unsequenced entry stamped with the current wall-clock time.
    #[allow(clippy::too_many_arguments)]
    pub fn attempt(
        worker:     WorkerId,
        buyer:      BuyerId,
        gate:       GateId,
        quantity:   u8,
        elapsed_ms: u64,
        success:    Option<bool>,
        error:      Option<String>,
    ) -> Self {
        Self {
            seq: 0,
            timestamp: Utc::now(),
            worker,
            buyer,
            gate,
            quantity,
            elapsed_ms,
            success,
            error,
            retry: 0,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }

    #[inline]
    pub fn is_declined(&self) -> bool {
        self.success == Some(false)
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.success.is_none()
    }
}
