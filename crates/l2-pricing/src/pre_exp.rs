//! The pre-exponential, pool-based controller (`arbos_version < 4`).
//!
//! A bounded gas pool is refilled at the speed limit and drained by burns
//! recorded through [`crate::add_to_gas_pool`] during the block. At block
//! close this module derives how full the pool averaged over the elapsed
//! interval, mixes that against a consumption-rate estimate, and steps the
//! base fee toward the mixed signal by at most a factor of
//! [`ELASTICITY_MULTIPLIER`].

use alloy_primitives::U256;
use database_interface::StorageBackend;

use crate::bips::{
    approx_exp_bips, big_mul_by_bips, sat_add_i64, sat_add_u64, sat_mul_i64, sat_mul_u64,
    sat_sub_i64, sat_ucast, Bips, SignedBips, ONE_IN_BIPS,
};
use crate::constants::{ELASTICITY_MULTIPLIER, EXP_ARG_TIME_DIVISOR, LEGACY_MIX_CLAMP_BIPS, LEGACY_MIX_CLAMP_VERSION};
use crate::error::PricingError;
use crate::state::PricingState;

/// Steps 1-7 of the pre-exponential algorithm.
///
/// `prev_base_fee` and `time_passed` are supplied by the caller rather than
/// re-derived from storage: the block executor, not this module, owns the
/// block header that `time_passed` comes from (§5). `debug` only gates the
/// diagnostic emitted when step 6's elasticity ceiling is hit; it never
/// changes the computed fee.
pub(crate) fn update_base_fee<S: StorageBackend>(
    state: &mut PricingState<'_, S>,
    prev_base_fee: U256,
    time_passed: u64,
    version: u64,
    debug: bool,
) -> Result<(), PricingError<S::Error>> {
    let pool_max = state.gas_pool_max()?;
    let gas_pool = state.gas_pool()?;
    let gas_pool_last_block = state.gas_pool_last_block()?;
    let speed_limit = state.speed_limit_per_second()?;
    let prior_rate = state.rate_estimate()?;
    let rate_inertia = state.rate_estimate_inertia()?;
    let pool_target = state.gas_pool_target()?;
    let pool_weight = state.gas_pool_weight()?;
    let min_base_fee = state.min_base_fee_wei()?;

    // Step 1: rate EWMA.
    let gas_used = sat_ucast(sat_sub_i64(
        gas_pool_last_block.min(pool_max),
        gas_pool.min(pool_max),
    ));
    let ewma_denominator = sat_add_u64(rate_inertia, time_passed).max(1);
    let rate = sat_add_u64(sat_mul_u64(rate_inertia, prior_rate), gas_used) / ewma_denominator;

    // Step 2: rate ratio, in bips.
    let rate_ratio_bips = ratio_bips(rate, speed_limit);

    // Step 3: pool fullness and refill.
    let (average_pool, new_gas_pool) = refill_pool(gas_pool, pool_max, speed_limit, time_passed);

    // Step 4: pool ratio, in bips - saturates to 0 once the pool is more than
    // 2x its target.
    let pool_target_gas = big_mul_by_bips_signed(pool_max, pool_target);
    let pool_ratio_bips = if pool_target_gas <= 0 {
        0
    } else {
        let numerator = 2i128 * pool_target_gas as i128 - average_pool as i128;
        if numerator <= 0 {
            0
        } else {
            ((numerator * ONE_IN_BIPS as i128) / pool_target_gas as i128)
                .clamp(0, u64::MAX as i128) as u64
        }
    };

    // Step 5: mix the two ratios by the pool weight.
    let rate_weight_bips = Bips::ONE.0.saturating_sub(pool_weight.0);
    let mixed_bips = sat_add_u64(
        mul_bips(pool_ratio_bips, pool_weight.0),
        mul_bips(rate_ratio_bips, rate_weight_bips),
    );
    let mixed_bips = if version < LEGACY_MIX_CLAMP_VERSION {
        mixed_bips.min(LEGACY_MIX_CLAMP_BIPS)
    } else {
        mixed_bips
    };

    // Step 6: translate the mix into an exponential step and clamp it.
    let exp_arg = (((mixed_bips as i128) - ONE_IN_BIPS as i128) * time_passed as i128
        / EXP_ARG_TIME_DIVISOR as i128)
        .clamp(i64::MIN as i128, i64::MAX as i128) as i64;
    let raw_price = big_mul_by_bips(prev_base_fee, approx_exp_bips(SignedBips(exp_arg)));
    let ceiling = prev_base_fee.saturating_mul(U256::from(ELASTICITY_MULTIPLIER));

    if debug && raw_price > ceiling {
        #[cfg(feature = "std")]
        std::eprintln!(
            "l2-pricing: pre-exponential step clamped at the elasticity ceiling ({raw_price} > {ceiling})"
        );
    }
    // `min` before `max`, not `clamp`: `clamp` panics if `min_base_fee > ceiling`,
    // which is unreachable for a well-formed `prev_base_fee >= min_base_fee` but
    // `prev_base_fee` is a caller-supplied parameter, not something this module
    // can assert on.
    let price = raw_price.min(ceiling).max(min_base_fee);

    // Step 7: persist.
    state.set_base_fee_wei(price)?;
    state.set_gas_pool(new_gas_pool)?;
    state.set_gas_pool_last_block(new_gas_pool)?;
    state.set_rate_estimate(rate)?;

    Ok(())
}

/// Computes the interval-average pool occupancy and the post-refill pool
/// level, handling the case where the pool saturates mid-interval.
fn refill_pool(gas_pool: i64, pool_max: i64, speed_limit: u64, time_passed: u64) -> (i64, i64) {
    let space_before = sat_sub_i64(pool_max, gas_pool);
    let time_to_full = if speed_limit == 0 {
        u64::MAX
    } else {
        sat_ucast(space_before) / speed_limit
    };

    if time_passed > time_to_full {
        let space_before_sq = (space_before as i128) * (space_before as i128);
        let denominator = 2i128 * speed_limit.max(1) as i128 * time_passed.max(1) as i128;
        let average = pool_max as i128 - space_before_sq / denominator;
        (average.clamp(i64::MIN as i128, i64::MAX as i128) as i64, pool_max)
    } else {
        let refill = sat_mul_i64(speed_limit as i64, time_passed as i64);
        let average = sat_add_i64(gas_pool, refill / 2);
        let new_pool = sat_add_i64(gas_pool, refill).min(pool_max);
        (average, new_pool)
    }
}

/// `observed / target`, expressed in bips, saturating rather than overflowing
/// when `observed` dwarfs `target`.
fn ratio_bips(observed: u64, target: u64) -> u64 {
    if target == 0 {
        return 0;
    }
    sat_mul_u64(observed, ONE_IN_BIPS) / target
}

fn mul_bips(ratio_bips: u64, weight_bips: u64) -> u64 {
    sat_mul_u64(ratio_bips, weight_bips) / ONE_IN_BIPS
}

fn big_mul_by_bips_signed(x: i64, b: Bips) -> i64 {
    (((x as i128) * (b.0 as i128)) / ONE_IN_BIPS as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
