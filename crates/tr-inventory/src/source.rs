//! The `InventorySource` trait, the engine's only view of the datastore.

use std::sync::Arc;

use tr_core::EventId;

use crate::{InventoryResult, PurchaseRequest, StockLot};

/// A ticket datastore.
///
/// # Contract
///
/// - [`read_stock`](Self::read_stock) reflects the sold/total counters at call
///   time.  No transaction spans the read and a later purchase.
/// - [`try_purchase`](Self::try_purchase) is atomic and authoritative: it
///   returns `Ok(true)` only if the full quantity was available and is now
///   consumed.  `Ok(false)` is a decline (e.g. the race was lost).
/// - `Err(_)` means the call could not complete.  Callers contain it.
///
/// # Thread safety
///
/// Every buyer worker calls into the same source from its own thread, so
/// implementations must be `Send + Sync` and must NOT serialize calls beyond
/// what their own concurrency control requires.
pub trait InventorySource: Send + Sync + 'static {
    /// Current stock for `event`.  An unknown event yields an empty list.
    fn read_stock(&self, event: EventId) -> InventoryResult<Vec<StockLot>>;

    /// Attempt to buy `request.quantity` units from `request.gate`.
    fn try_purchase(&self, request: &PurchaseRequest) -> InventoryResult<bool>;
}

impl<T: InventorySource + ?Sized> InventorySource for Arc<T> {
    fn read_stock(&self, event: EventId) -> InventoryResult<Vec<StockLot>> {
        (**self).read_stock(event)
    }

    fn try_purchase(&self, request: &PurchaseRequest) -> InventoryResult<bool> {
        (**self).try_purchase(request)
    }
}
