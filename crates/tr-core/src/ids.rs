//! Strongly typed identifier wrappers.
//!
//! Integer ids are `Copy + Ord + Hash` so they can be used as map keys and
//! sorted collection elements without ceremony.  `WorkerId` doubles as the
//! index into the pool's status board via `.index()`.
//!
//! `BuyerId` is different: it is never reused, never ordered, and is minted
//! fresh for every purchase attempt.

use std::fmt;

use uuid::Uuid;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a buyer worker in the pool.  Stable for the life of a run.
    pub struct WorkerId(u32);
}

typed_id! {
    /// The ticketed event every worker targets.
    pub struct EventId(u32);
}

typed_id! {
    /// A gate (sellable lot) within an event.
    pub struct GateId(u32);
}

// ── BuyerId ───────────────────────────────────────────────────────────────────

/// Identity of one purchase attempt.
///
/// Backed by a UUIDv7: a millisecond timestamp prefix plus 74 random bits, so
/// ids are unique across threads without coordination and sort roughly by
/// creation time in the log.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuyerId(pub Uuid);

impl BuyerId {
    /// Mint a new id.  Every call returns a distinct value.
    pub fn fresh() -> Self {
        BuyerId(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BuyerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
