//! Agent lifecycle state and the per-worker status board.
//!
//! # Why a board?
//!
//! The completion monitor has to observe every agent's lifecycle without
//! touching agent data or taking a lock.  `StatusBoard` is a flat array of
//! atomics indexed by `WorkerId`:
//!
//! - each slot is written only by its own agent ([`StatusSlot`]),
//! - the monitor only reads, so a full scan is `O(workers)` atomic loads.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tr_core::WorkerId;

/// Where an agent is in its purchase loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AgentState {
    WaitingForStart = 0,
    Fetching        = 1,
    Selecting       = 2,
    Purchasing      = 3,
    Logging         = 4,
    /// Terminal: a stock read found nothing sellable.
    Exhausted       = 5,
    /// Terminal: stopped by a stop signal, a tripped fault policy, or a panic.
    Halted          = 6,
}

impl AgentState {
    /// `true` once the agent will never run again.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentState::Exhausted | AgentState::Halted)
    }

    fn from_u8(v: u8) -> AgentState {
        match v {
            0 => AgentState::WaitingForStart,
            1 => AgentState::Fetching,
            2 => AgentState::Selecting,
            3 => AgentState::Purchasing,
            4 => AgentState::Logging,
            5 => AgentState::Exhausted,
            _ => AgentState::Halted,
        }
    }
}

/// One lifecycle slot per worker.  Every slot starts at `WaitingForStart`.
pub struct StatusBoard {
    slots: Vec<AtomicU8>,
}

impl StatusBoard {
    pub fn new(workers: usize) -> Self {
        Self {
            slots: (0..workers)
                .map(|_| AtomicU8::new(AgentState::WaitingForStart as u8))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current state of `worker`.
    ///
    /// # Panics
    /// Panics if `worker` is out of range.
    #[inline]
    pub fn state(&self, worker: WorkerId) -> AgentState {
        AgentState::from_u8(self.slots[worker.index()].load(Ordering::Acquire))
    }

    /// Workers not yet in a terminal state, in ascending id order.
    pub fn active(&self) -> Vec<WorkerId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !AgentState::from_u8(s.load(Ordering::Acquire)).is_terminal())
            .map(|(i, _)| WorkerId(i as u32))
            .collect()
    }

    /// Number of workers in `state`.
    pub fn count(&self, state: AgentState) -> usize {
        self.slots
            .iter()
            .filter(|s| s.load(Ordering::Acquire) == state as u8)
            .count()
    }

    /// Write handle for one worker's slot.
    pub fn slot(self: &Arc<Self>, worker: WorkerId) -> StatusSlot {
        assert!(worker.index() < self.slots.len(), "{worker} outside status board");
        StatusSlot { board: Arc::clone(self), worker }
    }
}

/// The write side of one worker's status, owned by that worker's agent.
pub struct StatusSlot {
    board:  Arc<StatusBoard>,
    worker: WorkerId,
}

impl StatusSlot {
    #[inline]
    pub fn set(&self, state: AgentState) {
        self.board.slots[self.worker.index()].store(state as u8, Ordering::Release);
    }

    #[inline]
    pub fn get(&self) -> AgentState {
        self.board.state(self.worker)
    }

    pub fn worker(&self) -> WorkerId {
        self.worker
    }
}
