//! The buyer loop.

use std::sync::Arc;
use std::time::Duration;

use tr_core::time::as_millis_u64;
use tr_core::{BuyerRng, EventId, FaultPolicy, LoaderConfig, WorkerId};
use tr_inventory::InventorySource;
use tr_output::{LogEntry, LogSink};

use crate::{
    AgentState, GateOutcome, PurchaseCoordinator, Selection, Selector, StartGate, StatusSlot,
    StopSignal,
};

// ── Wiring ────────────────────────────────────────────────────────────────────

/// The per-agent slice of [`LoaderConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentConfig {
    pub event:        EventId,
    /// Pause before re-reading stock after a read fault.
    pub read_retry:   Duration,
    pub fault_policy: FaultPolicy,
}

impl From<&LoaderConfig> for AgentConfig {
    fn from(cfg: &LoaderConfig) -> Self {
        Self {
            event:        cfg.event,
            read_retry:   cfg.read_retry(),
            fault_policy: cfg.fault_policy,
        }
    }
}

/// What the pool hands an agent when it starts it: the shared gate, the
/// shared stop flag, and the agent's own status slot.
pub struct AgentLink {
    pub gate: Arc<StartGate>,
    pub stop: StopSignal,
    pub slot: StatusSlot,
}

/// Per-agent tallies, returned when the agent's thread finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReport {
    pub worker:      WorkerId,
    pub final_state: AgentState,
    pub attempts:    u64,
    pub successes:   u64,
    pub declines:    u64,
    pub errors:      u64,
    /// Stock reads that faulted and were retried (never logged to the sink).
    pub read_faults: u64,
}

impl AgentReport {
    pub fn new(worker: WorkerId) -> Self {
        Self {
            worker,
            final_state: AgentState::WaitingForStart,
            attempts:    0,
            successes:   0,
            declines:    0,
            errors:      0,
            read_faults: 0,
        }
    }
}

// ── Buyer trait ───────────────────────────────────────────────────────────────

/// Anything the worker pool can run on a worker thread.
///
/// [`BuyerAgent`] is the real implementation; the trait exists so a pool can
/// be driven by scripted agents.
///
/// # Contract
///
/// `run` must leave `link.slot` in a terminal state when it returns.
pub trait Buyer: Send + 'static {
    fn run(self, link: &AgentLink) -> AgentReport;
}

// ── BuyerAgent ────────────────────────────────────────────────────────────────

/// One simulated buyer.
///
/// Owns its selector, coordinator, and RNG outright; only the datastore
/// handle, the log sink, and the [`AgentLink`] are shared.
pub struct BuyerAgent<I: InventorySource, S: Selector, L: LogSink> {
    worker:      WorkerId,
    config:      AgentConfig,
    coordinator: PurchaseCoordinator<I>,
    selector:    S,
    sink:        L,
    rng:         BuyerRng,
}

impl<I: InventorySource, S: Selector, L: LogSink> BuyerAgent<I, S, L> {
    pub fn new(
        worker:    WorkerId,
        config:    AgentConfig,
        inventory: I,
        selector:  S,
        sink:      L,
        rng:       BuyerRng,
    ) -> Self {
        Self {
            worker,
            config,
            coordinator: PurchaseCoordinator::new(inventory),
            selector,
            sink,
            rng,
        }
    }
}

/// Marks the slot `Halted` if the agent unwinds without reaching a terminal
/// state, so a panicking agent cannot hold the pool open forever.
struct TerminalGuard<'a>(&'a StatusSlot);

impl Drop for TerminalGuard<'_> {
    fn drop(&mut self) {
        if !self.0.get().is_terminal() {
            self.0.set(AgentState::Halted);
        }
    }
}

impl<I: InventorySource, S: Selector, L: LogSink> Buyer for BuyerAgent<I, S, L> {
    fn run(mut self, link: &AgentLink) -> AgentReport {
        let _guard = TerminalGuard(&link.slot);
        let mut report = AgentReport::new(self.worker);
        let mut fault_streak: u32 = 0;
        let event = self.config.event;

        link.slot.set(AgentState::WaitingForStart);
        if link.gate.wait(&link.stop) == GateOutcome::Stopped {
            tracing::debug!(worker = %self.worker, "stopped before the gate opened");
            return finish(link, report, AgentState::Halted);
        }

        loop {
            if link.stop.is_stopped() {
                tracing::debug!(worker = %self.worker, "stop signal observed");
                return finish(link, report, AgentState::Halted);
            }

            // ── Fetching ──────────────────────────────────────────────────
            link.slot.set(AgentState::Fetching);
            let lots = match self.coordinator.inventory().read_stock(event) {
                Ok(lots) => lots,
                Err(e) => {
                    report.read_faults += 1;
                    tracing::warn!(worker = %self.worker, error = %e, "stock read failed; retrying");
                    std::thread::sleep(self.config.read_retry);
                    continue;
                }
            };

            // ── Selecting ─────────────────────────────────────────────────
            link.slot.set(AgentState::Selecting);
            let request = match self.selector.select(event, &lots, &mut self.rng) {
                Selection::Buy(request) => request,
                Selection::Exhausted => {
                    tracing::debug!(worker = %self.worker, attempts = report.attempts, "exhausted");
                    return finish(link, report, AgentState::Exhausted);
                }
            };

            // ── Purchasing ────────────────────────────────────────────────
            link.slot.set(AgentState::Purchasing);
            let outcome = self.coordinator.attempt(&request);

            // ── Logging ───────────────────────────────────────────────────
            link.slot.set(AgentState::Logging);
            report.attempts += 1;
            match outcome.success {
                Some(true) => report.successes += 1,
                Some(false) => report.declines += 1,
                None => report.errors += 1,
            }
            let faulted = outcome.is_fault();
            self.sink.append(LogEntry::attempt(
                self.worker,
                request.buyer,
                request.gate,
                request.quantity,
                as_millis_u64(outcome.elapsed),
                outcome.success,
                outcome.error,
            ));

            fault_streak = next_streak(fault_streak, faulted);
            if let FaultPolicy::TripAfter(limit) = self.config.fault_policy {
                if fault_streak >= limit {
                    tracing::warn!(worker = %self.worker, streak = fault_streak, "fault breaker tripped");
                    return finish(link, report, AgentState::Halted);
                }
            }
        }
    }
}

/// Consecutive errored attempts after one more attempt.  Saturates, so an
/// agent retrying forever under `FaultPolicy::Unlimited` never overflows.
pub(crate) fn next_streak(streak: u32, faulted: bool) -> u32 {
    if faulted { streak.saturating_add(1) } else { 0 }
}

fn finish(link: &AgentLink, mut report: AgentReport, state: AgentState) -> AgentReport {
    debug_assert!(state.is_terminal());
    link.slot.set(state);
    report.final_state = state;
    report
}
