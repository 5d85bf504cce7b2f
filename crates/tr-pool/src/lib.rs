//! `tr-pool` — launches buyer agents and waits for them to finish.
//!
//! # Run lifecycle
//!
//! ```text
//! WorkerPool::spawn   build N agents via the factory, one OS thread each;
//!                     every agent parks at the StartGate
//! open_gate           release all agents at once (the thundering herd)
//! wait                CompletionMonitor polls the StatusBoard until every
//!                     slot is terminal, settles, re-confirms, then joins
//! ```
//!
//! `wait` has no timeout: an agent that faults on every purchase under
//! `FaultPolicy::Unlimited` never finishes, and neither does `wait`.  Use
//! [`WorkerPool::wait_timeout`] to observe such a run, then
//! [`WorkerPool::shutdown`] to stop it.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let pool = WorkerPool::spawn(&config, |worker, rng| {
//!     BuyerAgent::new(worker, (&config).into(), Arc::clone(&inv), RandomSelector, Arc::clone(&sink), rng)
//! })?;
//! pool.open_gate();
//! let report = pool.wait(&mut NoopObserver);
//! ```

pub mod error;
pub mod monitor;
pub mod observer;
pub mod pool;


pub use error::{PoolError, PoolResult};
pub use monitor::CompletionMonitor;
pub use observer::{NoopObserver, PoolObserver};
pub use pool::{PoolReport, WorkerPool, run};
