//! A deterministic L2 gas-pricing controller.
//!
//! The controller tracks a rollup's base fee the way Arbitrum's ArbOS does: it
//! meters gas consumption against a configured speed limit and feeds the
//! result into one of two pricing algorithms selected by protocol version
//! (§4). Everything here is pure integer arithmetic over a caller-supplied
//! [`StorageBackend`] - no wall-clock reads, no randomness, no floating point -
//! so two nodes applying the same sequence of blocks land on the same fee.
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

pub mod bips;
pub mod constants;
mod exp;
mod pre_exp;
pub mod slots;

mod error;
mod state;

use alloy_primitives::U256;

pub use bips::{Bips, SignedBips};
pub use database_interface::{Burner, StorageBackend};
pub use error::PricingError;
pub use state::PricingState;

use bips::{sat_add_i64, sat_sub_i64, sat_ucast};
use constants::EXPONENTIAL_PRICING_VERSION;

/// Writes genesis defaults into a fresh storage region and stamps the chain's
/// starting protocol version.
pub fn initialize<S: StorageBackend>(
    storage: &mut S,
    version: u64,
) -> Result<(), PricingError<S::Error>> {
    PricingState::initialize(storage, version)
}

/// Binds to an already-initialized storage region without writing anything.
pub fn open<S: StorageBackend>(storage: &mut S) -> PricingState<'_, S> {
    PricingState::open(storage)
}

/// Folds a signed gas delta into the controller's accumulator.
///
/// By convention the caller passes `-gas_used` as transactions burn gas, so a
/// negative `gas` always means "more gas was consumed". Below
/// [`EXPONENTIAL_PRICING_VERSION`] this adds directly to the bounded
/// `gas_pool`; at or above it, the same signed delta is folded into
/// `gas_backlog` the other way around (a negative delta grows the backlog). A
/// positive `gas` is also how [`update_pricing_model`]'s backlog branch
/// discharges the backlog by `speed_limit * time_passed` each update, reusing
/// this same call site.
pub fn add_to_gas_pool<S: StorageBackend>(
    state: &mut PricingState<'_, S>,
    gas: i64,
    version: u64,
) -> Result<(), PricingError<S::Error>> {
    if version < EXPONENTIAL_PRICING_VERSION {
        let pool_max = state.gas_pool_max()?;
        let new_pool = sat_add_i64(state.gas_pool()?, gas).min(pool_max);
        state.set_gas_pool(new_pool)?;
    } else {
        let backlog = state.gas_backlog()?;
        let backlog_signed = backlog.min(i64::MAX as u64) as i64;
        let new_backlog = sat_ucast(sat_sub_i64(backlog_signed, gas));
        state.set_gas_backlog(new_backlog)?;
    }
    Ok(())
}

/// Recomputes the base fee from whatever [`add_to_gas_pool`] has accumulated
/// since the previous call, dispatching on protocol version (§4.F).
///
/// `prev_base_fee` and `time_passed` come from the block the caller is
/// closing out, not from storage: the controller never reads a clock or
/// caches a fee across calls (§5, §9). `debug` only gates the diagnostic
/// emitted when the pre-exponential branch clamps at its elasticity ceiling;
/// it never changes the computed fee.
pub fn update_pricing_model<S: StorageBackend>(
    state: &mut PricingState<'_, S>,
    prev_base_fee: U256,
    time_passed: u64,
    version: u64,
    debug: bool,
) -> Result<(), PricingError<S::Error>> {
    if version < EXPONENTIAL_PRICING_VERSION {
        pre_exp::update_base_fee(state, prev_base_fee, time_passed, version, debug)
    } else {
        exp::update_base_fee(state, time_passed, version)
    }
}

/// The hard gas cap the next block must respect.
///
/// At or above [`EXPONENTIAL_PRICING_VERSION`] this is just the configured
/// constant; below it, a block is additionally capped by whatever remains in
/// the gas pool (floored at zero - a drained or negative pool permits no gas
/// at all until it refills).
pub fn per_block_gas_limit<S: StorageBackend>(
    state: &PricingState<'_, S>,
    version: u64,
) -> Result<u64, PricingError<S::Error>> {
    let configured = state.per_block_gas_limit()?;
    if version >= EXPONENTIAL_PRICING_VERSION {
        Ok(configured)
    } else {
        Ok(sat_ucast(state.gas_pool()?).min(configured))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constants::{DEFAULT_MIN_BASE_FEE_WEI, DEFAULT_SPEED_LIMIT_PER_SECOND};
    use database::InMemoryStorage;

    #[test]
    fn full_cycle_through_the_dispatcher_pre_exponential() {
        let mut db = InMemoryStorage::new();
        initialize(&mut db, 2).unwrap();
        let mut state = open(&mut db);
        state.set_rate_estimate(DEFAULT_SPEED_LIMIT_PER_SECOND).unwrap();

        add_to_gas_pool(&mut state, -(DEFAULT_SPEED_LIMIT_PER_SECOND as i64), 2).unwrap();
        update_pricing_model(&mut state, DEFAULT_MIN_BASE_FEE_WEI, 1, 2, false).unwrap();

        assert_eq!(state.base_fee_wei().unwrap(), DEFAULT_MIN_BASE_FEE_WEI);
    }

    #[test]
    fn full_cycle_through_the_dispatcher_exponential() {
        let mut db = InMemoryStorage::new();
        initialize(&mut db, EXPONENTIAL_PRICING_VERSION).unwrap();
        let mut state = open(&mut db);

        for _ in 0..10 {
            add_to_gas_pool(
                &mut state,
                -(5 * DEFAULT_SPEED_LIMIT_PER_SECOND as i64),
                EXPONENTIAL_PRICING_VERSION,
            )
            .unwrap();
            update_pricing_model(
                &mut state,
                DEFAULT_MIN_BASE_FEE_WEI,
                1,
                EXPONENTIAL_PRICING_VERSION,
                false,
            )
            .unwrap();
        }

        assert!(state.base_fee_wei().unwrap() > DEFAULT_MIN_BASE_FEE_WEI);
    }

    #[test]
    fn version_boundary_switches_algorithms() {
        let mut below = InMemoryStorage::new();
        initialize(&mut below, EXPONENTIAL_PRICING_VERSION - 1).unwrap();
        let mut above = InMemoryStorage::new();
        initialize(&mut above, EXPONENTIAL_PRICING_VERSION).unwrap();

        let mut below_state = open(&mut below);
        let mut above_state = open(&mut above);
        let burn = -(10 * DEFAULT_SPEED_LIMIT_PER_SECOND as i64);

        add_to_gas_pool(&mut below_state, burn, EXPONENTIAL_PRICING_VERSION - 1).unwrap();
        add_to_gas_pool(&mut above_state, burn, EXPONENTIAL_PRICING_VERSION).unwrap();

        assert!(below_state.gas_pool().unwrap() < below_state.gas_pool_max().unwrap());
        assert!(above_state.gas_backlog().unwrap() > 0);
    }

    #[test]
    fn per_block_gas_limit_is_constant_at_or_above_the_exponential_version() {
        let mut db = InMemoryStorage::new();
        initialize(&mut db, EXPONENTIAL_PRICING_VERSION).unwrap();
        let state = open(&mut db);
        assert_eq!(
            per_block_gas_limit(&state, EXPONENTIAL_PRICING_VERSION).unwrap(),
            constants::DEFAULT_PER_BLOCK_GAS_LIMIT
        );
    }

    #[test]
    fn per_block_gas_limit_is_capped_by_the_pool_below_the_exponential_version() {
        let mut db = InMemoryStorage::new();
        initialize(&mut db, 2).unwrap();
        let mut state = open(&mut db);
        state.set_gas_pool(-1).unwrap();
        assert_eq!(per_block_gas_limit(&state, 2).unwrap(), 0);
    }

    #[test]
    fn determinism_same_inputs_same_outputs() {
        let mut db_a = InMemoryStorage::new();
        let mut db_b = InMemoryStorage::new();
        initialize(&mut db_a, EXPONENTIAL_PRICING_VERSION).unwrap();
        initialize(&mut db_b, EXPONENTIAL_PRICING_VERSION).unwrap();

        let mut a = open(&mut db_a);
        let mut b = open(&mut db_b);

        for used in [500_000i64, 2_000_000, 100_000, 3_000_000] {
            add_to_gas_pool(&mut a, -used, EXPONENTIAL_PRICING_VERSION).unwrap();
            add_to_gas_pool(&mut b, -used, EXPONENTIAL_PRICING_VERSION).unwrap();
            update_pricing_model(
                &mut a,
                DEFAULT_MIN_BASE_FEE_WEI,
                1,
                EXPONENTIAL_PRICING_VERSION,
                false,
            )
            .unwrap();
            update_pricing_model(
                &mut b,
                DEFAULT_MIN_BASE_FEE_WEI,
                1,
                EXPONENTIAL_PRICING_VERSION,
                false,
            )
            .unwrap();
        }

        assert_eq!(a.base_fee_wei().unwrap(), b.base_fee_wei().unwrap());
    }

    #[test]
    fn round_trip_identity_at_steady_state() {
        let mut db = InMemoryStorage::new();
        initialize(&mut db, EXPONENTIAL_PRICING_VERSION).unwrap();
        let mut state = open(&mut db);
        state.set_gas_backlog(0).unwrap();

        let fee_before = state.base_fee_wei().unwrap();
        update_pricing_model(
            &mut state,
            fee_before,
            0,
            EXPONENTIAL_PRICING_VERSION,
            false,
        )
        .unwrap();

        assert_eq!(state.base_fee_wei().unwrap(), fee_before);
        assert_eq!(state.gas_backlog().unwrap(), 0);
    }
}
