//! Fixed slot numbering for the controller's persisted state.
//!
//! This numbering is part of the chain-state ABI: it is fixed at genesis and must
//! never be reassigned, or a chain's existing storage becomes unreadable by a node
//! that disagrees on which slot holds which field.

use database_interface::Slot;

pub const SPEED_LIMIT_PER_SECOND: Slot = 0;
pub const PER_BLOCK_GAS_LIMIT: Slot = 1;
pub const MIN_BASE_FEE_WEI: Slot = 2;
pub const BASE_FEE_WEI: Slot = 3;
pub const GAS_POOL: Slot = 4;
pub const GAS_POOL_LAST_BLOCK: Slot = 5;
pub const GAS_BACKLOG: Slot = 6;
pub const RATE_ESTIMATE: Slot = 7;
pub const RATE_ESTIMATE_INERTIA: Slot = 8;
pub const PRICING_INERTIA: Slot = 9;
pub const BACKLOG_TOLERANCE: Slot = 10;
pub const GAS_POOL_TARGET: Slot = 11;
pub const GAS_POOL_WEIGHT: Slot = 12;
pub const ARBOS_VERSION: Slot = 13;
pub const GAS_POOL_SECONDS: Slot = 14;
