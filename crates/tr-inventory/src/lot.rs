//! Plain data types exchanged with the datastore.

use tr_core::{BuyerId, EventId, GateId};

/// One sellable bucket of tickets at a gate/section, as read from the
/// datastore.
///
/// A snapshot: it is never updated in place.  `remaining` is derived from the
/// two counters on every call and deliberately has no backing field.
#[derive(Debug, Clone, PartialEq)]
pub struct StockLot {
    pub gate:       GateId,
    /// Human-readable gate label (e.g. `"A"`).
    pub gate_label: String,
    pub section:    String,
    /// Unit price; `None` when the datastore has no price on file.
    pub list_price: Option<f64>,
    pub sold:       i64,
    pub total:      i64,
}

impl StockLot {
    pub fn new(gate: GateId, sold: i64, total: i64) -> Self {
        Self {
            gate,
            gate_label: String::new(),
            section:    String::new(),
            list_price: None,
            sold,
            total,
        }
    }

    /// Units still for sale.  May be negative if the datastore oversold.
    #[inline]
    pub fn remaining(&self) -> i64 {
        self.total - self.sold
    }

    /// `true` if at least one unit can still be bought.  Negative remaining
    /// counts as not sellable.
    #[inline]
    pub fn is_sellable(&self) -> bool {
        self.remaining() > 0
    }
}

/// One purchase attempt, sent to [`InventorySource::try_purchase`].
///
/// [`InventorySource::try_purchase`]: crate::InventorySource::try_purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub event:    EventId,
    pub gate:     GateId,
    /// Fresh for every attempt; the datastore sees each as a new buyer.
    pub buyer:    BuyerId,
    /// Tickets requested, in `1..=4`.
    pub quantity: u8,
}

/// A lot tagged with the event it belongs to.  Used to seed datastores.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedLot {
    pub event: EventId,
    pub lot:   StockLot,
}
