//! Genesis defaults and consensus constants.
//!
//! The defaults mirror §3 of the design; the protocol constants are fixed across
//! every chain running this controller and are not configurable per-deployment.

use crate::bips::Bips;
use alloy_primitives::U256;

/// Target gas consumption rate, in gas per second.
pub const DEFAULT_SPEED_LIMIT_PER_SECOND: u64 = 1_000_000;
/// Hard cap on gas any single block may contain.
pub const DEFAULT_PER_BLOCK_GAS_LIMIT: u64 = 20_000_000;
/// Absolute floor on the base fee: 0.1 gwei.
pub const DEFAULT_MIN_BASE_FEE_WEI: U256 = U256::from_limbs([100_000_000u64, 0, 0, 0]);
/// How many seconds of gas-pool capacity the pre-exponential pool holds.
pub const DEFAULT_GAS_POOL_SECONDS: u64 = 600;
/// Seconds of EWMA memory for the consumption-rate estimate.
pub const DEFAULT_RATE_ESTIMATE_INERTIA: u64 = 60;
/// Time constant, in seconds, for the pre-exponential pool/rate mixing.
pub const DEFAULT_PRICING_INERTIA: u64 = 102;
/// Seconds of over-limit burn the exponential controller absorbs before reacting.
pub const DEFAULT_BACKLOG_TOLERANCE: u64 = 10;
/// Target pool fullness for the pre-exponential controller, 80%.
pub const DEFAULT_GAS_POOL_TARGET: Bips = Bips(8_000);
/// Weight given to pool fullness (vs. rate) in the pre-exponential mix, 60%.
pub const DEFAULT_GAS_POOL_WEIGHT: Bips = Bips(6_000);

/// Maximum per-block multiplicative increase under the pre-exponential controller.
pub const ELASTICITY_MULTIPLIER: u64 = 2;

/// Protocol version at which the pre-exponential pool-based controller is retired
/// in favor of the backlog-exponential controller.
pub const EXPONENTIAL_PRICING_VERSION: u64 = 4;

/// Below this protocol version, step 5's mixed ratio is additionally clamped to
/// 200%, a quirk of the earliest pre-exponential blocks preserved for replay.
pub const LEGACY_MIX_CLAMP_VERSION: u64 = 3;
/// The 200% ceiling applied to the mixed ratio below [`LEGACY_MIX_CLAMP_VERSION`].
pub const LEGACY_MIX_CLAMP_BIPS: u64 = 20_000;

/// Denominator spreading a full EIP-1559-style step over 120 seconds of elapsed
/// time, used when translating the mixed ratio into an exponent for
/// [`crate::bips::approx_exp_bips`].
pub const EXP_ARG_TIME_DIVISOR: i64 = 120;

/// Gas charged to the burner for each persisted field the controller rewrites,
/// mirroring the cost of an EVM `SSTORE` that modifies an already-warm, non-zero
/// slot (the controller's slots are always initialized at genesis, so a write is
/// never the zero-to-non-zero case).
pub const STORAGE_WRITE_GAS_COST: u64 = 5_000;
