//! One timed, fault-contained purchase attempt.

use std::time::Duration;

use tr_core::Stopwatch;
use tr_inventory::{InventorySource, PurchaseRequest};

/// What happened to one purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOutcome {
    /// `Some(true)` sold, `Some(false)` declined, `None` faulted.
    pub success: Option<bool>,
    /// Duration of the datastore write call alone.
    pub elapsed: Duration,
    /// Fault description; set exactly when `success` is `None`.
    pub error:   Option<String>,
}

impl PurchaseOutcome {
    #[inline]
    pub fn is_fault(&self) -> bool {
        self.success.is_none()
    }
}

/// Wraps [`InventorySource::try_purchase`] so that it can never fail.
///
/// A datastore error becomes an outcome with `success = None` and the error
/// text filled in; the caller always gets a [`PurchaseOutcome`] back and goes
/// on to log it.  There is no retry here and no backoff: the agent's loop is
/// the retry.
pub struct PurchaseCoordinator<I: InventorySource> {
    inventory: I,
}

impl<I: InventorySource> PurchaseCoordinator<I> {
    pub fn new(inventory: I) -> Self {
        Self { inventory }
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn attempt(&self, request: &PurchaseRequest) -> PurchaseOutcome {
        let sw = Stopwatch::start();
        let result = self.inventory.try_purchase(request);
        let elapsed = sw.elapsed();

        match result {
            Ok(success) => PurchaseOutcome { success: Some(success), elapsed, error: None },
            Err(e) => PurchaseOutcome { success: None, elapsed, error: Some(e.to_string()) },
        }
    }
}
