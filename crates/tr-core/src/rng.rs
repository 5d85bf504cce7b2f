//! Deterministic per-worker RNG.
//!
//! # Determinism strategy
//!
//! Each worker gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (worker_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive worker IDs uniformly across the seed space.
//!
//! - Workers never share RNG state (no contention, no ordering dependency).
//! - A seeded run makes the same lot/quantity choices per worker for the same
//!   sequence of stock snapshots.  The snapshots themselves depend on how the
//!   race plays out, so only the draws repeat, not whole runs.
//!
//! Buyer identities are NOT drawn from this RNG; see
//! [`BuyerId::fresh`](crate::BuyerId::fresh).

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::WorkerId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── SeedSource ────────────────────────────────────────────────────────────────

/// Where the global seed for a run comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SeedSource {
    /// Fixed seed: per-worker draws repeat across runs.
    Fixed(u64),
    /// Fresh entropy from the OS for every run.
    Entropy,
}

impl SeedSource {
    /// Resolve to a concrete global seed.
    pub fn resolve(self) -> u64 {
        match self {
            SeedSource::Fixed(seed) => seed,
            SeedSource::Entropy => rand::random(),
        }
    }
}

impl From<Option<u64>> for SeedSource {
    fn from(seed: Option<u64>) -> Self {
        seed.map_or(SeedSource::Entropy, SeedSource::Fixed)
    }
}

// ── BuyerRng ──────────────────────────────────────────────────────────────────

/// Per-worker RNG.
///
/// Create one per worker when the agent is built; it moves onto the worker's
/// thread with the agent and is never shared.
pub struct BuyerRng(SmallRng);

impl BuyerRng {
    /// Seed deterministically from the run's global seed and a worker ID.
    pub fn new(global_seed: u64, worker: WorkerId) -> Self {
        let seed = global_seed ^ (worker.0 as u64).wrapping_mul(MIXING_CONSTANT);
        BuyerRng(SmallRng::seed_from_u64(seed))
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Choose a random element from a slice.
    /// Returns `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
