//! The worker pool: one OS thread per buyer.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tr_agent::{AgentLink, AgentReport, AgentState, Buyer, StartGate, StatusBoard, StopSignal};
use tr_core::time::as_millis_u64;
use tr_core::{BuyerRng, LoaderConfig, SeedSource, Stopwatch, WorkerId};

use crate::{CompletionMonitor, NoopObserver, PoolError, PoolObserver, PoolResult};

/// Buyers are shallow loops; a small stack keeps 10k threads affordable.
const WORKER_STACK_BYTES: usize = 512 * 1024;

// ── PoolReport ────────────────────────────────────────────────────────────────

/// Per-agent reports for a finished pool, in `WorkerId` order.
#[derive(Debug, Clone)]
pub struct PoolReport {
    pub agents:  Vec<AgentReport>,
    /// Time from spawn to the last join.
    pub elapsed: Duration,
}

impl PoolReport {
    pub fn count(&self, state: AgentState) -> usize {
        self.agents.iter().filter(|a| a.final_state == state).count()
    }

    pub fn attempts(&self) -> u64 {
        self.agents.iter().map(|a| a.attempts).sum()
    }

    pub fn successes(&self) -> u64 {
        self.agents.iter().map(|a| a.successes).sum()
    }

    pub fn errors(&self) -> u64 {
        self.agents.iter().map(|a| a.errors).sum()
    }

    /// `true` if every agent ended because the stock ran out.
    pub fn all_exhausted(&self) -> bool {
        self.agents.iter().all(|a| a.final_state == AgentState::Exhausted)
    }
}

// ── WorkerPool ────────────────────────────────────────────────────────────────

/// `N` buyer agents running on dedicated threads behind one start gate.
///
/// Agents are built up front by a factory, so each owns its selector,
/// coordinator, and RNG.  They share only the gate, the stop signal, and the
/// status board.
pub struct WorkerPool {
    gate:    Arc<StartGate>,
    stop:    StopSignal,
    board:   Arc<StatusBoard>,
    monitor: CompletionMonitor,
    handles: Vec<(WorkerId, JoinHandle<AgentReport>)>,
    started: Stopwatch,
}

impl WorkerPool {
    /// Validate `config`, build `config.workers` agents with `factory`, and
    /// start each on its own thread.  The gate is left closed.
    ///
    /// `factory` receives each worker's id and its seeded [`BuyerRng`].
    ///
    /// If a thread cannot be spawned, the agents already started are stopped
    /// and joined before the error is returned.
    pub fn spawn<A, F>(config: &LoaderConfig, mut factory: F) -> PoolResult<Self>
    where
        A: Buyer,
        F: FnMut(WorkerId, BuyerRng) -> A,
    {
        config.validate()?;

        let seed = SeedSource::from(config.seed).resolve();
        let gate = Arc::new(StartGate::new(config.gate_poll()));
        let board = Arc::new(StatusBoard::new(config.workers));
        let mut pool = Self {
            gate,
            stop: StopSignal::new(),
            board,
            monitor: CompletionMonitor::from_config(config),
            handles: Vec::with_capacity(config.workers),
            started: Stopwatch::start(),
        };

        tracing::info!(workers = config.workers, event = %config.event, seed, "spawning buyer pool");

        for i in 0..config.workers {
            let worker = WorkerId(i as u32);
            let agent = factory(worker, BuyerRng::new(seed, worker));
            let link = AgentLink {
                gate: Arc::clone(&pool.gate),
                stop: pool.stop.clone(),
                slot: pool.board.slot(worker),
            };

            let spawned = thread::Builder::new()
                .name(format!("buyer-{i}"))
                .stack_size(WORKER_STACK_BYTES)
                .spawn(move || agent.run(&link));

            match spawned {
                Ok(handle) => pool.handles.push((worker, handle)),
                Err(source) => {
                    tracing::error!(%worker, error = %source, "thread spawn failed; stopping pool");
                    // Unspawned slots would otherwise read as active forever.
                    for j in i..config.workers {
                        pool.board.slot(WorkerId(j as u32)).set(AgentState::Halted);
                    }
                    pool.shutdown();
                    return Err(PoolError::Spawn { worker, source });
                }
            }
        }

        Ok(pool)
    }

    /// Number of worker threads.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Shared handle to the start gate, for triggers running elsewhere.
    pub fn gate(&self) -> Arc<StartGate> {
        Arc::clone(&self.gate)
    }

    /// Release every agent.  Returns `true` only for the call that opened it.
    pub fn open_gate(&self) -> bool {
        let opened = self.gate.open();
        if opened {
            tracing::info!(workers = self.handles.len(), "start gate opened");
        }
        opened
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    /// Block until every agent is terminal, then join them all.
    ///
    /// Never returns while any agent is still looping.
    pub fn wait(self, obs: &mut dyn PoolObserver) -> PoolReport {
        self.monitor.wait(&self.board, obs);
        let report = self.join();
        tracing::info!(
            attempts = report.attempts(),
            successes = report.successes(),
            elapsed_ms = as_millis_u64(report.elapsed),
            "buyer pool complete"
        );
        obs.on_complete(&report);
        report
    }

    /// Wait at most `timeout` for every agent to become terminal.
    ///
    /// On timeout the pool is left running and the still-active workers are
    /// reported in [`PoolError::Stalled`].  Call `wait` again or
    /// [`shutdown`](Self::shutdown).
    pub fn wait_timeout(&mut self, timeout: Duration, obs: &mut dyn PoolObserver) -> PoolResult<()> {
        let deadline = Instant::now() + timeout;
        self.monitor
            .wait_until(&self.board, Some(deadline), obs)
            .map_err(|active| {
                tracing::warn!(active = active.len(), "buyer pool did not complete in time");
                PoolError::Stalled { active }
            })
    }

    /// Raise the stop signal and join every agent.
    ///
    /// Agents halt at their next gate re-check or loop iteration; a datastore
    /// call already in flight is allowed to finish.
    pub fn shutdown(self) -> PoolReport {
        tracing::info!("stopping buyer pool");
        self.stop.stop();
        self.join()
    }

    fn join(self) -> PoolReport {
        let agents = self
            .handles
            .into_iter()
            .map(|(worker, handle)| match handle.join() {
                Ok(report) => report,
                Err(_) => {
                    tracing::error!(%worker, "buyer thread panicked");
                    AgentReport { final_state: AgentState::Halted, ..AgentReport::new(worker) }
                }
            })
            .collect();
        PoolReport { agents, elapsed: self.started.elapsed() }
    }
}

/// Spawn a pool, open the gate at once, and wait for it to finish.
pub fn run<A, F>(config: &LoaderConfig, factory: F) -> PoolResult<PoolReport>
where
    A: Buyer,
    F: FnMut(WorkerId, BuyerRng) -> A,
{
    let pool = WorkerPool::spawn(config, factory)?;
    pool.open_gate();
    Ok(pool.wait(&mut NoopObserver))
}
