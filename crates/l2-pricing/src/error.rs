//! Errors the controller can return.
//!
//! Arithmetic never fails - every integer operation saturates and every division
//! is guarded by a nonzero denominator - so only backend and metering failures
//! ever reach a caller (§7).

use core::fmt;

/// A failure that makes the enclosing block invalid.
///
/// Both variants are fatal and propagate identically: the controller does not
/// distinguish "couldn't read storage" from "couldn't afford to write it" in how
/// the error is handled, only in how it's reported.
#[derive(Debug, thiserror::Error)]
pub enum PricingError<E: fmt::Debug + fmt::Display> {
    /// The backing store returned an error on a read or write.
    #[error("l2 pricing storage error: {0}")]
    Storage(E),
    /// The system computation exhausted its gas budget while persisting state.
    #[error("l2 pricing burner exhausted: {0}")]
    Burner(#[from] database_interface::BurnerExhausted),
}
