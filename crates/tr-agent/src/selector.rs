//! Lot selection: which gate to hit and how many tickets to ask for.

use tr_core::{BuyerId, BuyerRng, EventId};
use tr_inventory::{PurchaseRequest, StockLot};

/// Smallest quantity a buyer asks for.
pub const MIN_QUANTITY: u8 = 1;
/// Largest quantity a buyer asks for.
pub const MAX_QUANTITY: u8 = 4;

/// Result of looking at one stock snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Attempt this purchase.
    Buy(PurchaseRequest),
    /// Nothing in the snapshot is sellable.  Not an error.
    Exhausted,
}

/// Pluggable purchase choice.
///
/// Called once per loop iteration with a fresh snapshot and the worker's own
/// RNG.  Implementations hold no per-worker state; anything random comes from
/// `rng` so that a seeded run makes the same draws per worker.
pub trait Selector: Send + 'static {
    fn select(&self, event: EventId, lots: &[StockLot], rng: &mut BuyerRng) -> Selection;
}

/// Lots in `lots` with `remaining > 0`, in snapshot order.
pub fn sellable(lots: &[StockLot]) -> Vec<&StockLot> {
    lots.iter().filter(|l| l.is_sellable()).collect()
}

/// Uniform choice of sellable lot, uniform quantity in
/// `MIN_QUANTITY..=MAX_QUANTITY`.
///
/// The quantity is not capped by the lot's remaining count: asking for more
/// than is left is a legitimate request the datastore must decline.
#[derive(Default, Clone, Copy)]
pub struct RandomSelector;

impl Selector for RandomSelector {
    fn select(&self, event: EventId, lots: &[StockLot], rng: &mut BuyerRng) -> Selection {
        let candidates = sellable(lots);
        let Some(lot) = rng.choose(&candidates) else {
            return Selection::Exhausted;
        };
        Selection::Buy(PurchaseRequest {
            event,
            gate:     lot.gate,
            buyer:    BuyerId::fresh(),
            quantity: rng.gen_range(MIN_QUANTITY..MAX_QUANTITY + 1),
        })
    }
}

/// Uniform choice of sellable lot with a fixed quantity.
///
/// Handy when a run must sell out in a predictable number of wins.
#[derive(Clone, Copy)]
pub struct FixedQuantity(pub u8);

impl Selector for FixedQuantity {
    fn select(&self, event: EventId, lots: &[StockLot], rng: &mut BuyerRng) -> Selection {
        let candidates = sellable(lots);
        let Some(lot) = rng.choose(&candidates) else {
            return Selection::Exhausted;
        };
        Selection::Buy(PurchaseRequest {
            event,
            gate:     lot.gate,
            buyer:    BuyerId::fresh(),
            quantity: self.0,
        })
    }
}
