//! An in-memory [`StorageBackend`] that keeps every slot in a `HashMap`.
//!
//! This is the reference implementation used by the controller's own test suite and
//! by integrators wiring up a fresh chain before a real backing store exists. It is
//! not meant to be a production key-value store: there is no persistence, no
//! snapshotting, and no concurrent access.
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

use std::collections::HashMap;

use database_interface::{B256, Burner, BurnerExhausted, Slot, StorageBackend};

/// A [`StorageBackend`] that stores every slot in memory.
///
/// Reads of a slot that was never written return [`B256::ZERO`], mirroring how a
/// fresh contract-storage trie answers an unset key.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InMemoryStorage {
    slots: HashMap<Slot, B256>,
    burner: GasBudgetBurner,
}

impl InMemoryStorage {
    /// Creates an empty store with an unmetered (effectively infinite) burner budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose burner starts with `gas_budget` to spend on writes.
    pub fn with_gas_budget(gas_budget: u64) -> Self {
        Self {
            slots: HashMap::default(),
            burner: GasBudgetBurner::new(gas_budget),
        }
    }

    /// Returns the raw contents of a slot without going through the [`StorageBackend`]
    /// trait, for asserting on persisted state in tests.
    pub fn raw_slot(&self, slot: Slot) -> B256 {
        self.slots.get(&slot).copied().unwrap_or_default()
    }

    /// Number of gas units the burner has left.
    pub fn remaining_gas(&self) -> u64 {
        self.burner.remaining
    }
}

impl StorageBackend for InMemoryStorage {
    type Error = core::convert::Infallible;
    type Burner = GasBudgetBurner;

    #[inline]
    fn get_word(&self, slot: Slot) -> Result<B256, Self::Error> {
        Ok(self.raw_slot(slot))
    }

    #[inline]
    fn set_word(&mut self, slot: Slot, value: B256) -> Result<(), Self::Error> {
        self.slots.insert(slot, value);
        Ok(())
    }

    #[inline]
    fn burner(&mut self) -> &mut Self::Burner {
        &mut self.burner
    }
}

/// A [`Burner`] that charges writes against a fixed starting gas budget.
///
/// Mirrors how an EVM interpreter's gas meter tracks `remaining` against a `limit`:
/// the budget only ever goes down, and a write that would take it negative is
/// rejected rather than wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GasBudgetBurner {
    limit: u64,
    remaining: u64,
}

impl GasBudgetBurner {
    /// Creates a burner with `limit` gas available to spend.
    pub const fn new(limit: u64) -> Self {
        Self {
            limit,
            remaining: limit,
        }
    }
}

impl Default for GasBudgetBurner {
    /// An effectively unmetered burner: integrators that don't care about system
    /// gas accounting can use the default store without tripping [`BurnerExhausted`].
    fn default() -> Self {
        Self::new(u64::MAX)
    }
}

impl Burner for GasBudgetBurner {
    fn restrict(&mut self, gas_cost: u64) -> Result<(), BurnerExhausted> {
        match self.remaining.checked_sub(gas_cost) {
            Some(remaining) => {
                self.remaining = remaining;
                Ok(())
            }
            None => Err(BurnerExhausted {
                requested: gas_cost,
                available: self.remaining,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_slot_reads_zero() {
        let db = InMemoryStorage::new();
        assert_eq!(db.get_word(42).unwrap(), B256::ZERO);
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut db = InMemoryStorage::new();
        let word = B256::repeat_byte(0xab);
        db.set_word(3, word).unwrap();
        assert_eq!(db.get_word(3).unwrap(), word);
    }

    #[test]
    fn gas_budget_burner_exhausts() {
        let mut burner = GasBudgetBurner::new(10);
        assert!(burner.restrict(4).is_ok());
        assert!(burner.restrict(4).is_ok());
        assert_eq!(
            burner.restrict(4),
            Err(BurnerExhausted {
                requested: 4,
                available: 2
            })
        );
    }

    #[test]
    fn limit_field_is_retained() {
        let burner = GasBudgetBurner::new(123);
        assert_eq!(burner.limit, 123);
    }
}
