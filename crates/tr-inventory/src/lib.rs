//! `tr-inventory` — the ticket datastore boundary.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`lot`]     | `StockLot`, `PurchaseRequest`, `SeedLot`                    |
//! | [`source`]  | `InventorySource` trait: read stock, try a purchase         |
//! | [`memory`]  | `MemoryInventory`, the in-process datastore                 |
//! | [`loader`]  | CSV stock loader                                            |
//! | [`sqlite`]  | `SqliteInventory` (feature `sqlite`)                        |
//! | [`error`]   | `InventoryError`, `InventoryResult<T>`                      |
//!
//! # Design notes
//!
//! The datastore is the single source of truth for stock.  Nothing in the
//! engine mirrors the counters in-process: every selection starts from a
//! fresh [`InventorySource::read_stock`] snapshot, and
//! [`InventorySource::try_purchase`] alone decides who wins a contended lot.

pub mod error;
pub mod loader;
pub mod lot;
pub mod memory;
pub mod source;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use error::{InventoryError, InventoryResult};
pub use loader::{load_lots_csv, load_lots_reader};
pub use lot::{PurchaseRequest, SeedLot, StockLot};
pub use memory::{MemoryInventory, PurchaseRecord};
pub use source::InventorySource;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteInventory;
