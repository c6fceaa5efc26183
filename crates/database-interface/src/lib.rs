//! Storage-slot interface.
//!
//! The gas-pricing controller holds no state of its own: every persisted scalar in
//! its data model (§3 of the design) lives behind a flat map from a fixed slot index
//! to a 32-byte word in an external key-value store. This crate defines the narrow
//! contract the controller consumes from that store, and nothing else - no account
//! model, no code, no logs.
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

use auto_impl::auto_impl;
use core::fmt;

pub use alloy_primitives::{B256, U256};

/// Index of a persisted scalar within the controller's flat slot space.
///
/// Slot numbering is part of the chain-state ABI: once a slot is assigned to a
/// named field it must never be reassigned, or genesis state becomes unreadable.
pub type Slot = u64;

/// Marker for backend error types, mirrored on [`Burner`] errors so both kinds of
/// failure can be folded into one caller-facing error without a blanket `From<E>`
/// impl colliding with the standard library's reflexive one.
pub trait StorageErrorMarker {}

impl StorageErrorMarker for core::convert::Infallible {}

/// Exhaustion of the gas budget the burner was given for this computation.
///
/// Every mutation the controller makes to the backing store is metered through a
/// [`Burner`]; running out mid-computation is fatal to the enclosing block, exactly
/// like a backend read or write error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("burner exhausted while charging {requested} gas ({available} available)")]
pub struct BurnerExhausted {
    /// Gas the write attempted to charge.
    pub requested: u64,
    /// Gas the burner actually had left.
    pub available: u64,
}

impl StorageErrorMarker for BurnerExhausted {}

/// Accountant for gas spent by the controller's own storage reads and writes.
///
/// `restrict` is called once per [`StorageBackend::set_word`]; an `Err` return is
/// forwarded by the controller as fatal (§7, error kind 2).
#[auto_impl(&mut, Box)]
pub trait Burner {
    /// Charge `gas_cost` against the remaining budget, failing if it would go negative.
    fn restrict(&mut self, gas_cost: u64) -> Result<(), BurnerExhausted>;
}

/// A [`Burner`] that never runs out, for callers that don't meter system gas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnmeteredBurner;

impl Burner for UnmeteredBurner {
    #[inline]
    fn restrict(&mut self, _gas_cost: u64) -> Result<(), BurnerExhausted> {
        Ok(())
    }
}

/// The external key-value store the controller persists its state through.
///
/// `get_word` returns the stored word, or the caller's chosen default when the slot
/// was never written (the controller itself never relies on an implicit default -
/// [`crate::Slot`] values are always initialized explicitly at genesis). `set_word`
/// must charge the write to the backend's [`Burner`] before (or atomically with)
/// persisting it.
#[auto_impl(&mut, Box)]
pub trait StorageBackend {
    /// The backend's read/write error type.
    type Error: StorageErrorMarker + fmt::Debug + fmt::Display;

    /// The burner type this backend meters writes through.
    type Burner: Burner;

    /// Reads the 32-byte word stored at `slot`.
    fn get_word(&self, slot: Slot) -> Result<B256, Self::Error>;

    /// Writes `value` to `slot`, charging the mutation to the burner.
    fn set_word(&mut self, slot: Slot, value: B256) -> Result<(), Self::Error>;

    /// Returns the burner this backend charges mutations to.
    fn burner(&mut self) -> &mut Self::Burner;
}
