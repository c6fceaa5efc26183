//! Typed accessors over the controller's persisted state.
//!
//! `PricingState` holds no cache: every getter re-reads through the
//! [`StorageBackend`] and every setter writes straight back through it, charging
//! the burner on the way. This makes the controller a pure function of
//! `(storage snapshot, inputs)`, which is what makes its output reproducible
//! across implementations and trivial to test (§9).

use alloy_primitives::{B256, U256};
use database_interface::{Burner, StorageBackend};

use crate::bips::Bips;
use crate::constants::{
    DEFAULT_BACKLOG_TOLERANCE, DEFAULT_GAS_POOL_SECONDS, DEFAULT_GAS_POOL_TARGET,
    DEFAULT_GAS_POOL_WEIGHT, DEFAULT_MIN_BASE_FEE_WEI, DEFAULT_PER_BLOCK_GAS_LIMIT,
    DEFAULT_PRICING_INERTIA, DEFAULT_RATE_ESTIMATE_INERTIA, DEFAULT_SPEED_LIMIT_PER_SECOND,
    STORAGE_WRITE_GAS_COST,
};
use crate::error::PricingError;
use crate::slots;

/// Binds a [`StorageBackend`] to the controller's fixed slot layout.
///
/// `PricingState` is a thin, stateless view: constructing one never touches the
/// backend. It borrows the backend mutably for its lifetime because every getter
/// may need to charge the burner reached through it (even reads are, in general,
/// metered by the caller's own accounting - the controller only meters writes).
#[derive(Debug)]
pub struct PricingState<'a, S: StorageBackend> {
    storage: &'a mut S,
}

impl<'a, S: StorageBackend> PricingState<'a, S> {
    /// Binds to an existing storage region without writing anything.
    pub fn open(storage: &'a mut S) -> Self {
        Self { storage }
    }

    /// Writes the genesis defaults enumerated in the data model, and stamps the
    /// initial protocol version.
    pub fn initialize(storage: &'a mut S, version: u64) -> Result<(), PricingError<S::Error>> {
        let mut state = Self::open(storage);

        state.set_speed_limit_per_second(DEFAULT_SPEED_LIMIT_PER_SECOND)?;
        state.set_per_block_gas_limit(DEFAULT_PER_BLOCK_GAS_LIMIT)?;
        state.set_min_base_fee_wei(DEFAULT_MIN_BASE_FEE_WEI)?;
        state.set_base_fee_wei(DEFAULT_MIN_BASE_FEE_WEI)?;
        state.set_gas_pool_seconds(DEFAULT_GAS_POOL_SECONDS)?;

        let pool_max = sat_mul_pool_max(DEFAULT_SPEED_LIMIT_PER_SECOND, DEFAULT_GAS_POOL_SECONDS);
        state.set_gas_pool(pool_max)?;
        state.set_gas_pool_last_block(pool_max)?;

        state.set_gas_backlog(0)?;
        state.set_rate_estimate(0)?;
        state.set_rate_estimate_inertia(DEFAULT_RATE_ESTIMATE_INERTIA)?;
        state.set_pricing_inertia(DEFAULT_PRICING_INERTIA)?;
        state.set_backlog_tolerance(DEFAULT_BACKLOG_TOLERANCE)?;
        state.set_gas_pool_target(DEFAULT_GAS_POOL_TARGET)?;
        state.set_gas_pool_weight(DEFAULT_GAS_POOL_WEIGHT)?;
        state.set_arbos_version(version)?;

        Ok(())
    }

    fn read_word(&self, slot: u64) -> Result<B256, PricingError<S::Error>> {
        self.storage.get_word(slot).map_err(PricingError::Storage)
    }

    fn write_word(&mut self, slot: u64, value: B256) -> Result<(), PricingError<S::Error>> {
        self.storage.burner().restrict(STORAGE_WRITE_GAS_COST)?;
        self.storage
            .set_word(slot, value)
            .map_err(PricingError::Storage)
    }

    fn read_u64(&self, slot: u64) -> Result<u64, PricingError<S::Error>> {
        Ok(word_to_u64(self.read_word(slot)?))
    }

    fn write_u64(&mut self, slot: u64, value: u64) -> Result<(), PricingError<S::Error>> {
        self.write_word(slot, u64_to_word(value))
    }

    fn read_i64(&self, slot: u64) -> Result<i64, PricingError<S::Error>> {
        Ok(word_to_i64(self.read_word(slot)?))
    }

    fn write_i64(&mut self, slot: u64, value: i64) -> Result<(), PricingError<S::Error>> {
        self.write_word(slot, i64_to_word(value))
    }

    fn read_u256(&self, slot: u64) -> Result<U256, PricingError<S::Error>> {
        Ok(U256::from_be_bytes(self.read_word(slot)?.0))
    }

    fn write_u256(&mut self, slot: u64, value: U256) -> Result<(), PricingError<S::Error>> {
        self.write_word(slot, B256::from(value.to_be_bytes()))
    }

    /// Target gas consumption rate, in gas per second.
    pub fn speed_limit_per_second(&self) -> Result<u64, PricingError<S::Error>> {
        self.read_u64(slots::SPEED_LIMIT_PER_SECOND)
    }

    /// Sets the target gas consumption rate.
    pub fn set_speed_limit_per_second(&mut self, v: u64) -> Result<(), PricingError<S::Error>> {
        self.write_u64(slots::SPEED_LIMIT_PER_SECOND, v)
    }

    /// Hard cap on gas any block may contain.
    pub fn per_block_gas_limit(&self) -> Result<u64, PricingError<S::Error>> {
        self.read_u64(slots::PER_BLOCK_GAS_LIMIT)
    }

    /// Sets the hard cap on gas any block may contain.
    pub fn set_per_block_gas_limit(&mut self, v: u64) -> Result<(), PricingError<S::Error>> {
        self.write_u64(slots::PER_BLOCK_GAS_LIMIT, v)
    }

    /// Absolute floor on the base fee.
    pub fn min_base_fee_wei(&self) -> Result<U256, PricingError<S::Error>> {
        self.read_u256(slots::MIN_BASE_FEE_WEI)
    }

    /// Sets the absolute floor on the base fee.
    pub fn set_min_base_fee_wei(&mut self, v: U256) -> Result<(), PricingError<S::Error>> {
        self.write_u256(slots::MIN_BASE_FEE_WEI, v)
    }

    /// The current base fee.
    pub fn base_fee_wei(&self) -> Result<U256, PricingError<S::Error>> {
        self.read_u256(slots::BASE_FEE_WEI)
    }

    /// Sets the current base fee.
    pub fn set_base_fee_wei(&mut self, v: U256) -> Result<(), PricingError<S::Error>> {
        self.write_u256(slots::BASE_FEE_WEI, v)
    }

    /// The pre-exponential gas pool. Negative when burn has outpaced refill.
    pub fn gas_pool(&self) -> Result<i64, PricingError<S::Error>> {
        self.read_i64(slots::GAS_POOL)
    }

    /// Sets the pre-exponential gas pool.
    pub fn set_gas_pool(&mut self, v: i64) -> Result<(), PricingError<S::Error>> {
        self.write_i64(slots::GAS_POOL, v)
    }

    /// Snapshot of the gas pool at the previous block boundary.
    pub fn gas_pool_last_block(&self) -> Result<i64, PricingError<S::Error>> {
        self.read_i64(slots::GAS_POOL_LAST_BLOCK)
    }

    /// Sets the gas-pool snapshot.
    pub fn set_gas_pool_last_block(&mut self, v: i64) -> Result<(), PricingError<S::Error>> {
        self.write_i64(slots::GAS_POOL_LAST_BLOCK, v)
    }

    /// How many seconds of capacity the pre-exponential gas pool holds.
    pub fn gas_pool_seconds(&self) -> Result<u64, PricingError<S::Error>> {
        self.read_u64(slots::GAS_POOL_SECONDS)
    }

    /// Sets how many seconds of capacity the pre-exponential gas pool holds.
    pub fn set_gas_pool_seconds(&mut self, v: u64) -> Result<(), PricingError<S::Error>> {
        self.write_u64(slots::GAS_POOL_SECONDS, v)
    }

    /// The exponential controller's accumulated excess-burn backlog.
    pub fn gas_backlog(&self) -> Result<u64, PricingError<S::Error>> {
        self.read_u64(slots::GAS_BACKLOG)
    }

    /// Sets the exponential controller's backlog.
    pub fn set_gas_backlog(&mut self, v: u64) -> Result<(), PricingError<S::Error>> {
        self.write_u64(slots::GAS_BACKLOG, v)
    }

    /// EWMA of consumption rate, in gas per second.
    pub fn rate_estimate(&self) -> Result<u64, PricingError<S::Error>> {
        self.read_u64(slots::RATE_ESTIMATE)
    }

    /// Sets the EWMA of consumption rate.
    pub fn set_rate_estimate(&mut self, v: u64) -> Result<(), PricingError<S::Error>> {
        self.write_u64(slots::RATE_ESTIMATE, v)
    }

    /// Seconds of memory for the rate EWMA.
    pub fn rate_estimate_inertia(&self) -> Result<u64, PricingError<S::Error>> {
        self.read_u64(slots::RATE_ESTIMATE_INERTIA)
    }

    /// Sets the seconds of memory for the rate EWMA.
    pub fn set_rate_estimate_inertia(&mut self, v: u64) -> Result<(), PricingError<S::Error>> {
        self.write_u64(slots::RATE_ESTIMATE_INERTIA, v)
    }

    /// Time constant for the pre-exponential pool/rate mix and the exponential
    /// controller's backlog response.
    pub fn pricing_inertia(&self) -> Result<u64, PricingError<S::Error>> {
        self.read_u64(slots::PRICING_INERTIA)
    }

    /// Sets the pricing inertia.
    pub fn set_pricing_inertia(&mut self, v: u64) -> Result<(), PricingError<S::Error>> {
        self.write_u64(slots::PRICING_INERTIA, v)
    }

    /// Seconds of over-limit burn the exponential controller absorbs before
    /// raising the fee.
    pub fn backlog_tolerance(&self) -> Result<u64, PricingError<S::Error>> {
        self.read_u64(slots::BACKLOG_TOLERANCE)
    }

    /// Sets the backlog tolerance, in seconds.
    pub fn set_backlog_tolerance(&mut self, v: u64) -> Result<(), PricingError<S::Error>> {
        self.write_u64(slots::BACKLOG_TOLERANCE, v)
    }

    /// Target pool fullness, in bips, for the pre-exponential controller.
    pub fn gas_pool_target(&self) -> Result<Bips, PricingError<S::Error>> {
        Ok(Bips(self.read_u64(slots::GAS_POOL_TARGET)?))
    }

    /// Sets the target pool fullness.
    pub fn set_gas_pool_target(&mut self, v: Bips) -> Result<(), PricingError<S::Error>> {
        self.write_u64(slots::GAS_POOL_TARGET, v.0)
    }

    /// Weight given to pool fullness (vs. rate) in the pre-exponential mix.
    pub fn gas_pool_weight(&self) -> Result<Bips, PricingError<S::Error>> {
        Ok(Bips(self.read_u64(slots::GAS_POOL_WEIGHT)?))
    }

    /// Sets the pool-fullness weight.
    pub fn set_gas_pool_weight(&mut self, v: Bips) -> Result<(), PricingError<S::Error>> {
        self.write_u64(slots::GAS_POOL_WEIGHT, v.0)
    }

    /// The chain's current protocol version.
    pub fn arbos_version(&self) -> Result<u64, PricingError<S::Error>> {
        self.read_u64(slots::ARBOS_VERSION)
    }

    /// Sets the chain's current protocol version.
    pub fn set_arbos_version(&mut self, v: u64) -> Result<(), PricingError<S::Error>> {
        self.write_u64(slots::ARBOS_VERSION, v)
    }

    /// `speed_limit_per_second * gas_pool_seconds`: the upper bound the
    /// pre-exponential gas pool saturates at.
    pub fn gas_pool_max(&self) -> Result<i64, PricingError<S::Error>> {
        Ok(sat_mul_pool_max(
            self.speed_limit_per_second()?,
            self.gas_pool_seconds()?,
        ))
    }
}

fn sat_mul_pool_max(speed_limit: u64, gas_pool_seconds: u64) -> i64 {
    speed_limit.saturating_mul(gas_pool_seconds).min(i64::MAX as u64) as i64
}

fn u64_to_word(v: u64) -> B256 {
    let mut buf = [0u8; 32];
    buf[24..32].copy_from_slice(&v.to_be_bytes());
    B256::from(buf)
}

fn word_to_u64(w: B256) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&w[24..32]);
    u64::from_be_bytes(buf)
}

fn i64_to_word(v: i64) -> B256 {
    u64_to_word(v as u64)
}

fn word_to_i64(w: B256) -> i64 {
    word_to_u64(w) as i64
}
