//! In-process datastore.
//!
//! One mutex guards the lot table, which makes `try_purchase` a single
//! check-and-decrement critical section.  Reads clone the lots under the same
//! lock, so a snapshot never observes a half-applied purchase.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tr_core::{BuyerId, EventId, GateId};

use crate::{InventoryError, InventoryResult, InventorySource, PurchaseRequest, SeedLot, StockLot};

/// A successful purchase, kept for post-run verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseRecord {
    pub event:    EventId,
    pub gate:     GateId,
    pub buyer:    BuyerId,
    pub quantity: u8,
}

#[derive(Default)]
struct Tables {
    lots:      HashMap<EventId, Vec<StockLot>>,
    purchases: Vec<PurchaseRecord>,
}

/// An [`InventorySource`] held entirely in memory.
///
/// Purchases are all-or-nothing: a request for more units than remain is
/// declined outright rather than partially filled.
#[derive(Default)]
pub struct MemoryInventory {
    tables: Mutex<Tables>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an inventory pre-loaded with `lots`.
    pub fn from_seed(lots: impl IntoIterator<Item = SeedLot>) -> Self {
        let inv = Self::new();
        {
            let mut tables = inv.tables.lock().unwrap_or_else(|p| p.into_inner());
            for SeedLot { event, lot } in lots {
                tables.lots.entry(event).or_default().push(lot);
            }
        }
        inv
    }

    /// Add (or replace, matched by gate) one lot.
    pub fn insert_lot(&self, event: EventId, lot: StockLot) -> InventoryResult<()> {
        let mut tables = self.lock()?;
        let lots = tables.lots.entry(event).or_default();
        match lots.iter_mut().find(|l| l.gate == lot.gate) {
            Some(existing) => *existing = lot,
            None => lots.push(lot),
        }
        Ok(())
    }

    /// Total units sold across every lot of `event`.
    pub fn units_sold(&self, event: EventId) -> InventoryResult<i64> {
        let tables = self.lock()?;
        Ok(tables
            .lots
            .get(&event)
            .map(|lots| lots.iter().map(|l| l.sold).sum())
            .unwrap_or(0))
    }

    /// Every successful purchase, in commit order.
    pub fn purchases(&self) -> InventoryResult<Vec<PurchaseRecord>> {
        Ok(self.lock()?.purchases.clone())
    }

    fn lock(&self) -> InventoryResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| InventoryError::Unavailable("inventory lock poisoned".into()))
    }
}

impl InventorySource for MemoryInventory {
    fn read_stock(&self, event: EventId) -> InventoryResult<Vec<StockLot>> {
        Ok(self.lock()?.lots.get(&event).cloned().unwrap_or_default())
    }

    fn try_purchase(&self, request: &PurchaseRequest) -> InventoryResult<bool> {
        let mut tables = self.lock()?;
        let Some(lot) = tables
            .lots
            .get_mut(&request.event)
            .and_then(|lots| lots.iter_mut().find(|l| l.gate == request.gate))
        else {
            return Ok(false);
        };

        let quantity = i64::from(request.quantity);
        if quantity == 0 || lot.remaining() < quantity {
            return Ok(false);
        }
        lot.sold += quantity;

        tables.purchases.push(PurchaseRecord {
            event:    request.event,
            gate:     request.gate,
            buyer:    request.buyer,
            quantity: request.quantity,
        });
        Ok(true)
    }
}
