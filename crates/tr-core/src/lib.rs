//! `tr-core` — foundational types for the `ticket_rush` contention simulator.
//!
//! This crate is a dependency of every other `tr-*` crate.  It has no `tr-*`
//! dependencies and only a handful of external ones (`rand`, `uuid`,
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `WorkerId`, `EventId`, `GateId`, `BuyerId`            |
//! | [`config`]      | `LoaderConfig`, `FaultPolicy`                         |
//! | [`time`]        | `Stopwatch`, millisecond helpers                      |
//! | [`rng`]         | `BuyerRng` (per-worker), `SeedSource`                 |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids and `LoaderConfig`.  |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{FaultPolicy, LoaderConfig};
pub use error::{CoreError, CoreResult};
pub use ids::{BuyerId, EventId, GateId, WorkerId};
pub use rng::{BuyerRng, SeedSource};
pub use time::Stopwatch;
