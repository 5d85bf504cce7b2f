//! SQLite datastore (feature `sqlite`).
//!
//! Mirrors a ticketing backend's stock-status query and its auto-buy
//! procedure against a single database file:
//!
//! - `ticket_gates`: one row per lot, with `sold` / `total` counters.
//! - `purchases`: one row per winning buyer.
//!
//! Every call opens its own connection, the way a service repository opens
//! one per request, so concurrent workers contend inside SQLite rather than
//! on a mutex in this process.  A purchase is a conditional `UPDATE` inside an
//! `IMMEDIATE` transaction: the write lock is taken up front and the row only
//! changes when the full quantity is still available.  `busy_timeout` makes
//! lock contention show up as latency instead of `SQLITE_BUSY` faults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use tr_core::{EventId, GateId};

use crate::{InventoryResult, InventorySource, PurchaseRequest, SeedLot, StockLot};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// An [`InventorySource`] backed by an SQLite database file.
pub struct SqliteInventory {
    path:         PathBuf,
    busy_timeout: Duration,
}

impl SqliteInventory {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: &Path) -> InventoryResult<Self> {
        let inv = Self {
            path:         path.to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        };
        let conn = inv.connect()?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             CREATE TABLE IF NOT EXISTS ticket_gates (
                 event_no   INTEGER NOT NULL,
                 gate_no    INTEGER NOT NULL,
                 gate       TEXT    NOT NULL,
                 section    TEXT    NOT NULL,
                 list_price REAL,
                 sold       INTEGER NOT NULL,
                 total      INTEGER NOT NULL,
                 PRIMARY KEY (event_no, gate_no)
             );
             CREATE TABLE IF NOT EXISTS purchases (
                 no           INTEGER PRIMARY KEY AUTOINCREMENT,
                 buyer        TEXT    NOT NULL,
                 event_no     INTEGER NOT NULL,
                 gate_no      INTEGER NOT NULL,
                 quantity     INTEGER NOT NULL,
                 purchased_at TEXT    NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
             );",
        )?;
        Ok(inv)
    }

    /// Override how long a call waits on a locked database before faulting.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Insert or replace seed lots in one transaction.
    pub fn seed(&self, lots: &[SeedLot]) -> InventoryResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO ticket_gates \
                 (event_no, gate_no, gate, section, list_price, sold, total) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for SeedLot { event, lot } in lots {
                stmt.execute(params![
                    event.0,
                    lot.gate.0,
                    lot.gate_label,
                    lot.section,
                    lot.list_price,
                    lot.sold,
                    lot.total,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Number of rows in the `purchases` table.
    pub fn purchase_count(&self) -> InventoryResult<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM purchases", [], |r| r.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Total units sold for `event`, or `None` if the event has no lots.
    pub fn units_sold(&self, event: EventId) -> InventoryResult<Option<i64>> {
        let conn = self.connect()?;
        let sold = conn
            .query_row(
                "SELECT SUM(sold) FROM ticket_gates WHERE event_no = ?1 HAVING COUNT(*) > 0",
                params![event.0],
                |r| r.get(0),
            )
            .optional()?;
        Ok(sold)
    }

    fn connect(&self) -> InventoryResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }
}

impl InventorySource for SqliteInventory {
    fn read_stock(&self, event: EventId) -> InventoryResult<Vec<StockLot>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare_cached(
            "SELECT gate_no, gate, section, list_price, sold, total \
             FROM ticket_gates WHERE event_no = ?1 ORDER BY gate_no",
        )?;
        let lots = stmt
            .query_map(params![event.0], |r| {
                Ok(StockLot {
                    gate:       GateId(r.get(0)?),
                    gate_label: r.get(1)?,
                    section:    r.get(2)?,
                    list_price: r.get(3)?,
                    sold:       r.get(4)?,
                    total:      r.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lots)
    }

    fn try_purchase(&self, request: &PurchaseRequest) -> InventoryResult<bool> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE ticket_gates SET sold = sold + ?3 \
             WHERE event_no = ?1 AND gate_no = ?2 AND ?3 > 0 AND total - sold >= ?3",
            params![request.event.0, request.gate.0, request.quantity],
        )?;
        if changed == 1 {
            tx.execute(
                "INSERT INTO purchases (buyer, event_no, gate_no, quantity) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    request.buyer.to_string(),
                    request.event.0,
                    request.gate.0,
                    request.quantity,
                ],
            )?;
        }
        tx.commit()?;
        Ok(changed == 1)
    }
}
