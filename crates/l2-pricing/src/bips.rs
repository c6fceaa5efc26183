//! Saturating fixed-point arithmetic.
//!
//! Everything the controller computes is deterministic integer arithmetic that
//! clamps at its bounds instead of wrapping or panicking: two validators that run
//! the same block must land on the same base fee bit-for-bit, so there is no room
//! for an overflow trap or a floating-point rounding mode to diverge between hosts.

use alloy_primitives::U256;

/// One whole unit expressed in basis points.
pub const ONE_IN_BIPS: u64 = 10_000;

/// A non-negative quantity expressed in basis points (1/10_000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bips(pub u64);

impl Bips {
    /// `10_000` bips, i.e. a multiplier of 1.0.
    pub const ONE: Bips = Bips(ONE_IN_BIPS);
    /// `0` bips.
    pub const ZERO: Bips = Bips(0);

    /// Converts a whole-percent value (`0..=100` typically, but unchecked) to bips.
    pub const fn percent_to_bips(percent: u64) -> Bips {
        Bips(percent.saturating_mul(100))
    }

    /// Converts a natural-number multiplier (e.g. `2` for 200%) to bips.
    pub const fn natural_to_bips(n: u64) -> Bips {
        Bips(n.saturating_mul(ONE_IN_BIPS))
    }
}

/// A quantity expressed in basis points that may be negative, used for the signed
/// exponent fed into [`approx_exp_bips`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SignedBips(pub i64);

impl SignedBips {
    /// Zero exponent - `approx_exp_bips` of this is exactly [`Bips::ONE`].
    pub const ZERO: SignedBips = SignedBips(0);
}

/// Saturating addition for unsigned 64-bit gas-domain quantities.
#[inline]
pub fn sat_add_u64(a: u64, b: u64) -> u64 {
    a.saturating_add(b)
}

/// Saturating subtraction for unsigned 64-bit gas-domain quantities.
#[inline]
pub fn sat_sub_u64(a: u64, b: u64) -> u64 {
    a.saturating_sub(b)
}

/// Saturating multiplication for unsigned 64-bit gas-domain quantities.
#[inline]
pub fn sat_mul_u64(a: u64, b: u64) -> u64 {
    a.saturating_mul(b)
}

/// Saturating addition for signed 64-bit gas-pool quantities.
#[inline]
pub fn sat_add_i64(a: i64, b: i64) -> i64 {
    a.saturating_add(b)
}

/// Saturating subtraction for signed 64-bit gas-pool quantities.
#[inline]
pub fn sat_sub_i64(a: i64, b: i64) -> i64 {
    a.saturating_sub(b)
}

/// Saturating multiplication for signed 64-bit gas-pool quantities.
#[inline]
pub fn sat_mul_i64(a: i64, b: i64) -> i64 {
    a.saturating_mul(b)
}

/// Clamps a signed quantity into an unsigned one, flooring negatives at zero.
#[inline]
pub fn sat_ucast(x: i64) -> u64 {
    if x < 0 { 0 } else { x as u64 }
}

/// `(x * b) / 10_000`, rounded down.
///
/// `x` is saturated rather than allowed to overflow `U256`; in practice no
/// wei-denominated price this controller ever computes gets close to that bound.
#[inline]
pub fn big_mul_by_bips(x: U256, b: Bips) -> U256 {
    x.saturating_mul(U256::from(b.0)) / U256::from(ONE_IN_BIPS)
}

/// The widest exponent magnitude [`approx_exp_bips`] is accurate for: `x` outside
/// `[-MAX_EXPONENT_BIPS, MAX_EXPONENT_BIPS]` is clamped to the boundary before the
/// series is evaluated, so the function always terminates and never overflows its
/// `u128` accumulator.
const MAX_EXPONENT_BIPS: i64 = 20 * ONE_IN_BIPS as i64;

/// Upper bound on Taylor-series terms evaluated per call; the series converges
/// long before this for every `x` in the supported range, but the cap keeps the
/// function's step count bounded independent of input, per the no-unbounded-loops
/// rule the rest of the controller follows.
const MAX_SERIES_TERMS: u32 = 128;

/// Approximates `exp(x / 10_000)` and returns the result scaled back into bips.
///
/// This is consensus-critical: every implementation of the controller must
/// compute byte-identical output for the same `x`, so the algorithm below -
/// not "whatever `exp()` the host's math library returns" - is the specification.
///
/// The positive branch sums the integer Taylor series for `e^y` entirely in
/// `u128` arithmetic, the same technique [EIP-4844's blob base fee uses][eip-4844]
/// for its `fake_exponential` helper: `factor * sum_i (y/d)^i / i!`, carried with
/// `factor = d = 10_000` so the running sum stays in bips. The negative branch is
/// computed as the reciprocal of the positive branch (`e^{-y} = 1 / e^{y}`), which
/// keeps the whole function monotonically non-decreasing in `x` without needing a
/// second series.
///
/// [eip-4844]: https://eips.ethereum.org/EIPS/eip-4844#helpers
///
/// - `x == 0` returns exactly `Bips::ONE` (10_000).
/// - `x <= 0` returns a value `<= Bips::ONE`.
/// - Large positive `x` saturates at the boundary of the supported range instead
///   of overflowing.
pub fn approx_exp_bips(x: SignedBips) -> Bips {
    if x.0 == 0 {
        return Bips::ONE;
    }

    let clamped = x.0.clamp(-MAX_EXPONENT_BIPS, MAX_EXPONENT_BIPS);
    let magnitude = exp_series_bips(clamped.unsigned_abs());

    let result = if clamped >= 0 {
        magnitude
    } else if magnitude == 0 {
        0
    } else {
        // e^{-y} = 1 / e^{y}; both sides carry an extra factor of ONE_IN_BIPS, so
        // dividing the squared unit by `magnitude` cancels back down to bips.
        ((ONE_IN_BIPS as u128) * (ONE_IN_BIPS as u128)) / magnitude
    };

    Bips(result.min(u64::MAX as u128) as u64)
}

/// Sums the Taylor series for `e^(y / 10_000)` scaled into bips, for `y >= 0`.
fn exp_series_bips(y: u64) -> u128 {
    let denominator = ONE_IN_BIPS as u128;
    let numerator = y as u128;

    let mut term = denominator * denominator;
    let mut output = term;
    let mut i: u128 = 1;
    while term > 0 && i <= MAX_SERIES_TERMS as u128 {
        term = (term * numerator) / (denominator * i);
        output += term;
        i += 1;
    }
    output / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_exponent_is_exactly_one() {
        assert_eq!(approx_exp_bips(SignedBips::ZERO), Bips::ONE);
    }

    #[test]
    fn negative_exponent_stays_at_or_below_one() {
        assert!(approx_exp_bips(SignedBips(-1)).0 <= ONE_IN_BIPS);
        assert!(approx_exp_bips(SignedBips(-5_000)).0 <= ONE_IN_BIPS);
        assert!(approx_exp_bips(SignedBips(-200_000)).0 <= ONE_IN_BIPS);
    }

    #[test]
    fn positive_exponent_stays_at_or_above_one() {
        assert!(approx_exp_bips(SignedBips(1)).0 >= ONE_IN_BIPS);
        assert!(approx_exp_bips(SignedBips(5_000)).0 >= ONE_IN_BIPS);
    }

    #[test]
    fn monotonically_non_decreasing() {
        let samples = [
            -200_000, -50_000, -10_000, -1_000, -1, 0, 1, 1_000, 10_000, 50_000, 200_000,
        ];
        let mut prev = 0u64;
        for (idx, &x) in samples.iter().enumerate() {
            let value = approx_exp_bips(SignedBips(x)).0;
            if idx > 0 {
                assert!(value >= prev, "not monotonic at x={x}: {value} < {prev}");
            }
            prev = value;
        }
    }

    #[test]
    fn large_positive_exponent_saturates_without_overflow() {
        let value = approx_exp_bips(SignedBips(i64::MAX));
        assert!(value.0 > ONE_IN_BIPS);
    }

    #[test]
    fn approximately_e_at_one_natural_unit() {
        // exp(1) ~= 2.71828; at x = 10_000 bips (y = 1.0) we expect ~27182 bips,
        // within the ~0.1% accuracy the spec calls for.
        let value = approx_exp_bips(SignedBips(ONE_IN_BIPS as i64)).0;
        let expected = 27_183u64;
        let diff = value.abs_diff(expected);
        assert!(diff * 1000 <= expected, "value={value} expected~={expected}");
    }

    #[test]
    fn big_mul_by_bips_truncates_down() {
        let x = U256::from(3u64);
        // 3 * 5000 / 10000 = 1.5 -> truncates to 1
        assert_eq!(big_mul_by_bips(x, Bips(5_000)), U256::from(1u64));
    }

    #[test]
    fn sat_ucast_floors_negative_at_zero() {
        assert_eq!(sat_ucast(-1), 0);
        assert_eq!(sat_ucast(0), 0);
        assert_eq!(sat_ucast(42), 42);
    }

    #[test]
    fn sat_add_u64_clamps_at_max() {
        assert_eq!(sat_add_u64(u64::MAX, 10), u64::MAX);
    }

    #[test]
    fn sat_sub_i64_clamps_at_min() {
        assert_eq!(sat_sub_i64(i64::MIN, 10), i64::MIN);
    }
}
