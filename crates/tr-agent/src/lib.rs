//! `tr-agent` — one simulated buyer and the primitives it runs against.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`gate`]        | `StartGate` latch, `StopSignal`                            |
//! | [`state`]       | `AgentState`, `StatusBoard` (one atomic slot per worker)   |
//! | [`selector`]    | `Selector` trait, `RandomSelector`, `FixedQuantity`        |
//! | [`coordinator`] | `PurchaseCoordinator`, `PurchaseOutcome`                   |
//! | [`agent`]       | `BuyerAgent` loop, `Buyer` trait, `AgentLink`, reports     |
//!
//! # Agent loop
//!
//! ```text
//! WaitingForStart ──gate opens──▶ Fetching ──▶ Selecting ──▶ Purchasing ──▶ Logging
//!                                    ▲  │ read fault: pause, retry          │
//!                                    │  └──────────┘                         │
//!                                    └───────────────────────────────────────┘
//!                                 Selecting finds nothing sellable ──▶ Exhausted
//! ```
//!
//! Agents share nothing mutable with each other except the gate latch and
//! their own status slot.  Every stock read is a private snapshot and the
//! datastore alone arbitrates contended purchases.

pub mod agent;
pub mod coordinator;
pub mod gate;
pub mod selector;
pub mod state;

#[cfg(test)]
mod tests;

pub use agent::{AgentConfig, AgentLink, AgentReport, Buyer, BuyerAgent};
pub use coordinator::{PurchaseCoordinator, PurchaseOutcome};
pub use gate::{GateOutcome, StartGate, StopSignal};
pub use selector::{FixedQuantity, RandomSelector, Selection, Selector};
pub use state::{AgentState, StatusBoard, StatusSlot};
