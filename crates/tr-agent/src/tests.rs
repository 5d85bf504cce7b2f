//! Unit tests for tr-agent.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tr_core::{EventId, FaultPolicy, GateId, WorkerId};
use tr_inventory::{InventoryError, InventoryResult, InventorySource, PurchaseRequest, StockLot};

use crate::{AgentConfig, AgentLink, StartGate, StatusBoard, StopSignal};

// ── Helpers ───────────────────────────────────────────────────────────────────

const EVENT: EventId = EventId(7);
const POLL: Duration = Duration::from_millis(5);

fn config() -> AgentConfig {
    AgentConfig {
        event:        EVENT,
        read_retry:   Duration::from_millis(1),
        fault_policy: FaultPolicy::Unlimited,
    }
}

fn open_link(worker: WorkerId) -> (AgentLink, Arc<StatusBoard>) {
    let board = Arc::new(StatusBoard::new(worker.index() + 1));
    let gate = Arc::new(StartGate::new(POLL));
    gate.open();
    let link = AgentLink { gate, stop: StopSignal::new(), slot: board.slot(worker) };
    (link, board)
}

/// Datastore double: a fixed stock snapshot, every write faults.
struct FaultyWrites {
    lots:   Vec<StockLot>,
    writes: AtomicUsize,
}

impl FaultyWrites {
    fn new(lots: Vec<StockLot>) -> Self {
        Self { lots, writes: AtomicUsize::new(0) }
    }
}

impl InventorySource for FaultyWrites {
    fn read_stock(&self, _event: EventId) -> InventoryResult<Vec<StockLot>> {
        Ok(self.lots.clone())
    }

    fn try_purchase(&self, _request: &PurchaseRequest) -> InventoryResult<bool> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        Err(InventoryError::Unavailable("deadlock victim".into()))
    }
}

/// Datastore double: the first `failures` reads fault, then the stock is empty.
struct FlakyReads {
    failures: usize,
    reads:    AtomicUsize,
}

impl InventorySource for FlakyReads {
    fn read_stock(&self, _event: EventId) -> InventoryResult<Vec<StockLot>> {
        let n = self.reads.fetch_add(1, Ordering::Relaxed);
        if n < self.failures {
            Err(InventoryError::Unavailable("connection reset".into()))
        } else {
            Ok(Vec::new())
        }
    }

    fn try_purchase(&self, _request: &PurchaseRequest) -> InventoryResult<bool> {
        Ok(false)
    }
}

// ── StartGate / StopSignal ────────────────────────────────────────────────────

#[cfg(test)]
mod gate_tests {
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Instant;

    use super::*;
    use crate::GateOutcome;

    #[test]
    fn open_is_idempotent() {
        let gate = StartGate::new(POLL);
        assert!(!gate.is_open());
        assert!(gate.open());
        assert!(!gate.open());
        assert!(gate.is_open());
    }

    #[test]
    fn open_gate_returns_immediately() {
        let gate = StartGate::new(Duration::from_secs(10));
        gate.open();
        let t0 = Instant::now();
        assert_eq!(gate.wait(&StopSignal::new()), GateOutcome::Opened);
        assert!(t0.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn waiters_block_until_open() {
        const K: usize = 8;
        let poll = Duration::from_millis(50);
        let gate = Arc::new(StartGate::new(poll));
        let released = Arc::new(AtomicUsize::new(0));
        let stop = StopSignal::new();

        let handles: Vec<_> = (0..K)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let released = Arc::clone(&released);
                let stop = stop.clone();
                thread::spawn(move || {
                    let outcome = gate.wait(&stop);
                    let at = Instant::now();
                    released.fetch_add(1, Ordering::SeqCst);
                    (outcome, at)
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(150));
        assert_eq!(released.load(Ordering::SeqCst), 0, "no waiter may pass a closed gate");

        let opened_at = Instant::now();
        gate.open();
        for h in handles {
            let (outcome, at) = h.join().unwrap();
            assert_eq!(outcome, GateOutcome::Opened);
            let latency = at.saturating_duration_since(opened_at);
            assert!(latency < poll + Duration::from_millis(25), "waiter released after {latency:?}");
        }
        assert_eq!(released.load(Ordering::SeqCst), K);
    }

    #[test]
    fn stop_releases_closed_gate() {
        let gate = Arc::new(StartGate::new(POLL));
        let stop = StopSignal::new();
        let waiting = Arc::new(AtomicBool::new(false));

        let h = {
            let gate = Arc::clone(&gate);
            let stop = stop.clone();
            let waiting = Arc::clone(&waiting);
            thread::spawn(move || {
                waiting.store(true, Ordering::SeqCst);
                gate.wait(&stop)
            })
        };
        while !waiting.load(Ordering::SeqCst) {
            thread::yield_now();
        }
        stop.stop();
        assert_eq!(h.join().unwrap(), GateOutcome::Stopped);
        assert!(!gate.is_open());
    }

    #[test]
    fn stop_signal_clones_share_state() {
        let a = StopSignal::new();
        let b = a.clone();
        assert!(!b.is_stopped());
        a.stop();
        assert!(b.is_stopped());
    }
}

// ── StatusBoard ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod state_tests {
    use super::*;
    use crate::AgentState;

    #[test]
    fn board_starts_waiting() {
        let board = StatusBoard::new(3);
        assert_eq!(board.len(), 3);
        assert_eq!(board.count(AgentState::WaitingForStart), 3);
        assert_eq!(board.active(), vec![WorkerId(0), WorkerId(1), WorkerId(2)]);
    }

    #[test]
    fn slot_writes_only_its_worker() {
        let board = Arc::new(StatusBoard::new(3));
        let slot = board.slot(WorkerId(1));
        slot.set(AgentState::Purchasing);
        assert_eq!(board.state(WorkerId(0)), AgentState::WaitingForStart);
        assert_eq!(board.state(WorkerId(1)), AgentState::Purchasing);
        assert_eq!(slot.get(), AgentState::Purchasing);
    }

    #[test]
    fn terminal_states_leave_active_set() {
        let board = Arc::new(StatusBoard::new(3));
        board.slot(WorkerId(0)).set(AgentState::Exhausted);
        board.slot(WorkerId(2)).set(AgentState::Halted);
        assert_eq!(board.active(), vec![WorkerId(1)]);
        assert!(AgentState::Exhausted.is_terminal());
        assert!(!AgentState::Logging.is_terminal());
    }

    #[test]
    #[should_panic]
    fn slot_out_of_range_panics() {
        let board = Arc::new(StatusBoard::new(1));
        let _ = board.slot(WorkerId(1));
    }
}

// ── Selectors ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod selector_tests {
    use proptest::prelude::*;
    use tr_core::BuyerRng;

    use super::*;
    use crate::selector::{MAX_QUANTITY, MIN_QUANTITY};
    use crate::{FixedQuantity, RandomSelector, Selection, Selector};

    fn lots_from(counts: &[(i64, i64)]) -> Vec<StockLot> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &(sold, total))| StockLot::new(GateId(i as u32), sold, total))
            .collect()
    }

    proptest! {
        #[test]
        fn picks_sellable_lot_and_bounded_quantity(
            counts in prop::collection::vec((0i64..20, 0i64..20), 1..12),
            seed in any::<u64>(),
        ) {
            let lots = lots_from(&counts);
            prop_assume!(lots.iter().any(|l| l.is_sellable()));
            let mut rng = BuyerRng::new(seed, WorkerId(0));

            match RandomSelector.select(EVENT, &lots, &mut rng) {
                Selection::Buy(req) => {
                    let lot = lots.iter().find(|l| l.gate == req.gate).unwrap();
                    prop_assert!(lot.is_sellable());
                    prop_assert!((MIN_QUANTITY..=MAX_QUANTITY).contains(&req.quantity));
                    prop_assert_eq!(req.event, EVENT);
                }
                Selection::Exhausted => prop_assert!(false, "sellable snapshot reported exhausted"),
            }
        }

        #[test]
        fn nothing_sellable_is_exhausted(
            counts in prop::collection::vec((0i64..20, -5i64..=0), 0..12),
            seed in any::<u64>(),
        ) {
            // total - sold <= 0 for every lot: remaining zero or negative.
            let lots: Vec<StockLot> = counts
                .iter()
                .enumerate()
                .map(|(i, &(sold, delta))| StockLot::new(GateId(i as u32), sold, sold + delta))
                .collect();
            let mut rng = BuyerRng::new(seed, WorkerId(3));
            prop_assert_eq!(RandomSelector.select(EVENT, &lots, &mut rng), Selection::Exhausted);
        }
    }

    #[test]
    fn fixed_quantity_is_honoured() {
        let lots = lots_from(&[(0, 1)]);
        let mut rng = BuyerRng::new(1, WorkerId(0));
        match FixedQuantity(3).select(EVENT, &lots, &mut rng) {
            Selection::Buy(req) => {
                assert_eq!(req.quantity, 3);
                assert_eq!(req.gate, GateId(0));
            }
            Selection::Exhausted => panic!("expected a purchase"),
        }
    }

    #[test]
    fn every_call_mints_a_new_buyer() {
        let lots = lots_from(&[(0, 100)]);
        let mut rng = BuyerRng::new(1, WorkerId(0));
        let a = RandomSelector.select(EVENT, &lots, &mut rng);
        let b = RandomSelector.select(EVENT, &lots, &mut rng);
        match (a, b) {
            (Selection::Buy(a), Selection::Buy(b)) => assert_ne!(a.buyer, b.buyer),
            _ => panic!("expected two purchases"),
        }
    }

    #[test]
    fn same_seed_same_draws() {
        let lots = lots_from(&[(0, 5), (0, 5), (0, 5), (0, 5)]);
        let draw = |seed| {
            let mut rng = BuyerRng::new(seed, WorkerId(9));
            (0..20)
                .map(|_| match RandomSelector.select(EVENT, &lots, &mut rng) {
                    Selection::Buy(r) => (r.gate, r.quantity),
                    Selection::Exhausted => unreachable!(),
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(42), draw(42));
    }
}

// ── PurchaseCoordinator ───────────────────────────────────────────────────────

#[cfg(test)]
mod coordinator_tests {
    use tr_core::BuyerId;
    use tr_inventory::{MemoryInventory, SeedLot};

    use super::*;
    use crate::PurchaseCoordinator;

    fn request(quantity: u8) -> PurchaseRequest {
        PurchaseRequest { event: EVENT, gate: GateId(1), buyer: BuyerId::fresh(), quantity }
    }

    #[test]
    fn fault_becomes_outcome() {
        let coord = PurchaseCoordinator::new(FaultyWrites::new(Vec::new()));
        let out = coord.attempt(&request(1));
        assert_eq!(out.success, None);
        assert!(out.is_fault());
        assert!(out.error.as_deref().unwrap().contains("deadlock victim"));
    }

    #[test]
    fn decline_is_not_a_fault() {
        let inv = MemoryInventory::from_seed([SeedLot { event: EVENT, lot: StockLot::new(GateId(1), 0, 1) }]);
        let coord = PurchaseCoordinator::new(inv);
        assert_eq!(coord.attempt(&request(2)).success, Some(false));
        let won = coord.attempt(&request(1));
        assert_eq!(won.success, Some(true));
        assert_eq!(won.error, None);
    }
}

// ── BuyerAgent ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod agent_tests {
    use tr_core::BuyerRng;
    use tr_inventory::{MemoryInventory, SeedLot};
    use tr_output::MemorySink;

    use super::*;
    use crate::{AgentState, Buyer, BuyerAgent, FixedQuantity, RandomSelector};

    fn seeded(total: i64) -> Arc<MemoryInventory> {
        Arc::new(MemoryInventory::from_seed([SeedLot { event: EVENT, lot: StockLot::new(GateId(1), 0, total) }]))
    }

    #[test]
    fn lone_agent_buys_out_the_lot() {
        let inv = seeded(3);
        let sink = Arc::new(MemorySink::new());
        let (link, board) = open_link(WorkerId(0));
        let agent = BuyerAgent::new(
            WorkerId(0),
            config(),
            Arc::clone(&inv),
            FixedQuantity(1),
            Arc::clone(&sink),
            BuyerRng::new(1, WorkerId(0)),
        );

        let report = agent.run(&link);
        assert_eq!(report.final_state, AgentState::Exhausted);
        assert_eq!(report.successes, 3);
        assert_eq!(report.attempts, 3);
        assert_eq!(board.state(WorkerId(0)), AgentState::Exhausted);
        assert_eq!(inv.units_sold(EVENT).unwrap(), 3);

        let entries = sink.entries();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.is_success() && e.retry == 0 && e.quantity == 1));
    }

    #[test]
    fn oversized_requests_are_logged_as_declines() {
        // One unit left: a quantity > 1 is declined until a 1 is drawn.
        let inv = seeded(1);
        let sink = Arc::new(MemorySink::new());
        let (link, _board) = open_link(WorkerId(0));
        let agent = BuyerAgent::new(
            WorkerId(0),
            config(),
            Arc::clone(&inv),
            RandomSelector,
            Arc::clone(&sink),
            BuyerRng::new(5, WorkerId(0)),
        );

        let report = agent.run(&link);
        assert_eq!(report.successes, 1);
        assert_eq!(report.attempts, report.successes + report.declines);
        assert_eq!(sink.len() as u64, report.attempts);
        assert_eq!(inv.units_sold(EVENT).unwrap(), 1);
    }

    #[test]
    fn empty_event_exhausts_without_logging() {
        let inv = Arc::new(MemoryInventory::new());
        let sink = Arc::new(MemorySink::new());
        let (link, _board) = open_link(WorkerId(0));
        let agent = BuyerAgent::new(
            WorkerId(0),
            config(),
            inv,
            RandomSelector,
            Arc::clone(&sink),
            BuyerRng::new(1, WorkerId(0)),
        );
        let report = agent.run(&link);
        assert_eq!(report.final_state, AgentState::Exhausted);
        assert_eq!(report.attempts, 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn read_faults_are_retried_and_not_logged() {
        let inv = Arc::new(FlakyReads { failures: 3, reads: AtomicUsize::new(0) });
        let sink = Arc::new(MemorySink::new());
        let (link, _board) = open_link(WorkerId(0));
        let agent = BuyerAgent::new(
            WorkerId(0),
            config(),
            Arc::clone(&inv),
            RandomSelector,
            Arc::clone(&sink),
            BuyerRng::new(1, WorkerId(0)),
        );
        let report = agent.run(&link);
        assert_eq!(report.read_faults, 3);
        assert_eq!(report.final_state, AgentState::Exhausted);
        assert_eq!(inv.reads.load(Ordering::Relaxed), 4);
        assert!(sink.is_empty());
    }

    #[test]
    fn fault_breaker_halts_after_streak() {
        let inv = Arc::new(FaultyWrites::new(vec![StockLot::new(GateId(1), 0, 10)]));
        let sink = Arc::new(MemorySink::new());
        let (link, board) = open_link(WorkerId(0));
        let cfg = AgentConfig { fault_policy: FaultPolicy::TripAfter(4), ..config() };
        let agent = BuyerAgent::new(
            WorkerId(0),
            cfg,
            Arc::clone(&inv),
            RandomSelector,
            Arc::clone(&sink),
            BuyerRng::new(1, WorkerId(0)),
        );

        let report = agent.run(&link);
        assert_eq!(report.final_state, AgentState::Halted);
        assert_eq!(report.errors, 4);
        assert_eq!(board.state(WorkerId(0)), AgentState::Halted);

        let entries = sink.entries();
        assert_eq!(entries.len(), 4);
        for e in &entries {
            assert_eq!(e.success, None);
            assert_eq!(e.retry, 0);
            assert!(e.error.as_deref().unwrap().contains("deadlock victim"));
        }
    }

    #[test]
    fn stop_before_open_halts_at_gate() {
        let board = Arc::new(StatusBoard::new(1));
        let link = AgentLink {
            gate: Arc::new(StartGate::new(POLL)),
            stop: StopSignal::new(),
            slot: board.slot(WorkerId(0)),
        };
        link.stop.stop();
        let agent = BuyerAgent::new(
            WorkerId(0),
            config(),
            seeded(5),
            RandomSelector,
            Arc::new(MemorySink::new()),
            BuyerRng::new(1, WorkerId(0)),
        );
        let report = agent.run(&link);
        assert_eq!(report.final_state, AgentState::Halted);
        assert_eq!(report.attempts, 0);
    }

    #[test]
    fn fault_streak_saturates() {
        use crate::agent::next_streak;

        assert_eq!(next_streak(0, true), 1);
        assert_eq!(next_streak(7, false), 0);
        assert_eq!(next_streak(u32::MAX - 1, true), u32::MAX);
        assert_eq!(next_streak(u32::MAX, true), u32::MAX);
    }

    #[test]
    fn config_from_loader_config() {
        let lc = tr_core::LoaderConfig { event: EventId(3), read_retry_ms: 20, ..Default::default() };
        let ac = AgentConfig::from(&lc);
        assert_eq!(ac.event, EventId(3));
        assert_eq!(ac.read_retry, Duration::from_millis(20));
        assert_eq!(ac.fault_policy, FaultPolicy::Unlimited);
    }
}
