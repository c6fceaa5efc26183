//! The backlog-exponential controller (`arbos_version >= 4`).
//!
//! The pool from the pre-exponential controller is retired. Instead a single
//! accumulator, `gas_backlog`, grows by gas burned beyond the speed limit and
//! is discharged by `speed_limit * time_passed` each update - the same
//! excess-gas accounting [EIP-4844 uses for blob base fees][eip-4844]. Once
//! the backlog exceeds `backlog_tolerance` seconds' worth of free capacity,
//! the excess becomes the exponent applied to the floor price.
//!
//! [eip-4844]: https://eips.ethereum.org/EIPS/eip-4844#helpers

use database_interface::StorageBackend;

use crate::bips::{approx_exp_bips, big_mul_by_bips, sat_mul_u64, sat_sub_u64, SignedBips, ONE_IN_BIPS};
use crate::error::PricingError;
use crate::state::PricingState;

/// Step 1 discharges the backlog by reusing [`crate::add_to_gas_pool`] with a
/// positive delta, the same call site the pre-exponential branch uses for
/// burns (negative deltas); step 2 prices whatever backlog remains.
pub(crate) fn update_base_fee<S: StorageBackend>(
    state: &mut PricingState<'_, S>,
    time_passed: u64,
    version: u64,
) -> Result<(), PricingError<S::Error>> {
    let speed_limit = state.speed_limit_per_second()?;
    let refill = sat_mul_u64(speed_limit, time_passed).min(i64::MAX as u64) as i64;
    crate::add_to_gas_pool(state, refill, version)?;

    let backlog = state.gas_backlog()?;
    let backlog_tolerance = state.backlog_tolerance()?;
    let tolerance_buffer = sat_mul_u64(backlog_tolerance, speed_limit);
    let min_base_fee = state.min_base_fee_wei()?;

    let base_fee = if backlog > tolerance_buffer {
        let excess = sat_sub_u64(backlog, tolerance_buffer);
        let pricing_inertia = state.pricing_inertia()?;
        let denominator = sat_mul_u64(pricing_inertia, speed_limit).max(1);
        let exponent_bips = exponent_in_bips(excess, denominator);
        big_mul_by_bips(min_base_fee, approx_exp_bips(SignedBips(exponent_bips))).max(min_base_fee)
    } else {
        min_base_fee
    };

    state.set_base_fee_wei(base_fee)?;
    Ok(())
}

/// `excess * 10_000 / denominator`, clamped into `i64`'s range so it can feed
/// [`approx_exp_bips`] without overflowing the saturating cast.
fn exponent_in_bips(excess: u64, denominator: u64) -> i64 {
    let scaled = (excess as u128) * (ONE_IN_BIPS as u128) / (denominator as u128);
    scaled.min(i64::MAX as u128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        DEFAULT_BACKLOG_TOLERANCE, DEFAULT_MIN_BASE_FEE_WEI, DEFAULT_PRICING_INERTIA,
        DEFAULT_SPEED_LIMIT_PER_SECOND, EXPONENTIAL_PRICING_VERSION,
    };
    use crate::state::PricingState;
    use database::InMemoryStorage;

    fn fresh() -> InMemoryStorage {
        let mut db = InMemoryStorage::new();
        PricingState::initialize(&mut db, EXPONENTIAL_PRICING_VERSION).unwrap();
        db
    }

    #[test]
    fn below_tolerance_base_fee_sits_at_the_floor() {
        let mut db = fresh();
        let mut state = PricingState::open(&mut db);
        state.set_gas_backlog(0).unwrap();

        update_base_fee(&mut state, 0, EXPONENTIAL_PRICING_VERSION).unwrap();
        assert_eq!(state.base_fee_wei().unwrap(), DEFAULT_MIN_BASE_FEE_WEI);
    }

    #[test]
    fn above_tolerance_matches_the_hand_computed_exponent() {
        let mut db = fresh();
        let mut state = PricingState::open(&mut db);
        // backlog = 100x the speed limit, tolerance = 10s, inertia = 102.
        state
            .set_gas_backlog(100 * DEFAULT_SPEED_LIMIT_PER_SECOND)
            .unwrap();

        update_base_fee(&mut state, 0, EXPONENTIAL_PRICING_VERSION).unwrap();

        let tolerance_buffer = DEFAULT_BACKLOG_TOLERANCE * DEFAULT_SPEED_LIMIT_PER_SECOND;
        let excess = 100 * DEFAULT_SPEED_LIMIT_PER_SECOND - tolerance_buffer;
        let denominator = DEFAULT_PRICING_INERTIA * DEFAULT_SPEED_LIMIT_PER_SECOND;
        let expected_exponent = exponent_in_bips(excess, denominator);
        assert_eq!(expected_exponent, 8823);

        let expected_fee = big_mul_by_bips(
            DEFAULT_MIN_BASE_FEE_WEI,
            approx_exp_bips(SignedBips(expected_exponent)),
        );
        assert_eq!(state.base_fee_wei().unwrap(), expected_fee.max(DEFAULT_MIN_BASE_FEE_WEI));
    }

    #[test]
    fn base_fee_is_monotone_in_backlog() {
        let mut low_db = fresh();
        let mut low_state = PricingState::open(&mut low_db);
        low_state.set_gas_backlog(1_000).unwrap();
        update_base_fee(&mut low_state, 0, EXPONENTIAL_PRICING_VERSION).unwrap();

        let mut high_db = fresh();
        let mut high_state = PricingState::open(&mut high_db);
        high_state.set_gas_backlog(10_000_000).unwrap();
        update_base_fee(&mut high_state, 0, EXPONENTIAL_PRICING_VERSION).unwrap();

        assert!(high_state.base_fee_wei().unwrap() >= low_state.base_fee_wei().unwrap());
    }

    #[test]
    fn step_one_discharges_the_backlog_by_speed_limit_times_elapsed() {
        let mut db = fresh();
        let mut state = PricingState::open(&mut db);
        state
            .set_gas_backlog(5 * DEFAULT_SPEED_LIMIT_PER_SECOND)
            .unwrap();

        update_base_fee(&mut state, 2, EXPONENTIAL_PRICING_VERSION).unwrap();
        assert_eq!(state.gas_backlog().unwrap(), 3 * DEFAULT_SPEED_LIMIT_PER_SECOND);
    }
}
