//! CSV stock loader.
//!
//! # CSV format
//!
//! One row per lot.  `list_price` may be left empty.
//!
//! ```csv
//! event_no,gate_no,gate,section,list_price,sold,total
//! 1,1,A,Floor,120.00,0,500
//! 1,2,B,Balcony,,0,250
//! ```
//!
//! Rows with `sold > total` are accepted: the engine tolerates oversold lots
//! and treats them as not sellable.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use tr_core::{EventId, GateId};

use crate::{InventoryError, InventoryResult, SeedLot, StockLot};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LotRecord {
    event_no:   u32,
    gate_no:    u32,
    gate:       String,
    section:    String,
    list_price: Option<f64>,
    sold:       i64,
    total:      i64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load seed lots from a CSV file.
pub fn load_lots_csv(path: &Path) -> InventoryResult<Vec<SeedLot>> {
    let file = std::fs::File::open(path)?;
    load_lots_reader(file)
}

/// Like [`load_lots_csv`] but accepts any `Read` source.
pub fn load_lots_reader<R: Read>(reader: R) -> InventoryResult<Vec<SeedLot>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut lots = Vec::new();

    for (line, result) in csv_reader.deserialize::<LotRecord>().enumerate() {
        let row = result.map_err(|e| InventoryError::Parse(e.to_string()))?;
        if row.total < 0 || row.sold < 0 {
            return Err(InventoryError::Parse(format!(
                "row {}: sold and total must be non-negative (sold={}, total={})",
                line + 1,
                row.sold,
                row.total
            )));
        }
        lots.push(SeedLot {
            event: EventId(row.event_no),
            lot:   StockLot {
                gate:       GateId(row.gate_no),
                gate_label: row.gate,
                section:    row.section,
                list_price: row.list_price,
                sold:       row.sold,
                total:      row.total,
            },
        });
    }

    tracing::debug!(lots = lots.len(), "loaded stock seed");
    Ok(lots)
}
