//! # Slash Throttle
//!
//! The slash meter bounds how much voting power may be jailed per replenish
//! period. Ceiling and floor are derived from total bonded power at every
//! replenishment:
//!
//! ```text
//! ceiling   = max(1, ceiling_fraction × total)
//! floor     = -(floor_fraction × total)
//! allowance = min(ceiling, allowance + replenish_fraction × total)
//! ```
//!
//! A slash of power `p` is applied iff `p == 0` or `allowance - p >= floor`.
//! Otherwise it waits in a global FIFO queue; the head of the queue blocks
//! every later entry.

use super::params::ProviderParams;
use ccv_types::{ChainId, ConsAddress, SlashPacketData, Timestamp, VscMaturedPacketData};
use serde::{Deserialize, Serialize};

/// Result of asking the meter about a slash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Apply now; the allowance was decremented.
    Apply,
    /// Hold in the throttle queue.
    Queue,
}

/// Global slash meter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashMeter {
    /// Power that may still be jailed. Negative means deficit.
    pub allowance: i64,
    /// Upper bound of the allowance.
    pub ceiling: i64,
    /// Lower bound the allowance may reach (non-positive).
    pub floor: i64,
    /// Block time of the last replenishment.
    pub last_replenish: Timestamp,
}

impl SlashMeter {
    /// Full meter for `total_power`.
    pub fn new(total_power: i64, params: &ProviderParams, now: Timestamp) -> Self {
        let (ceiling, floor) = Self::bounds(total_power, params);
        Self {
            allowance: ceiling,
            ceiling,
            floor,
            last_replenish: now,
        }
    }

    /// `(ceiling, floor)` for `total_power`.
    pub fn bounds(total_power: i64, params: &ProviderParams) -> (i64, i64) {
        let ceiling = params
            .slash_meter_ceiling_fraction
            .mul_floor(total_power)
            .max(1);
        let floor = -params
            .slash_meter_floor_fraction
            .mul_floor(total_power)
            .max(0);
        (ceiling, floor)
    }

    /// True if a slash of `power` fits.
    pub fn would_allow(&self, power: i64) -> bool {
        power == 0 || self.allowance.saturating_sub(power) >= self.floor
    }

    /// Decide on a slash of `power`, decrementing on `Apply`.
    pub fn allow(&mut self, power: i64) -> ThrottleDecision {
        if self.would_allow(power) {
            self.allowance = self.allowance.saturating_sub(power);
            ThrottleDecision::Apply
        } else {
            ThrottleDecision::Queue
        }
    }

    /// True once a full replenish period elapsed.
    pub fn replenish_due(&self, now: Timestamp, period: u64) -> bool {
        now >= self.last_replenish.saturating_add(period)
    }

    /// Recompute bounds and add one period's worth of allowance.
    pub fn replenish(&mut self, total_power: i64, params: &ProviderParams, now: Timestamp) {
        let (ceiling, floor) = Self::bounds(total_power, params);
        let amount = params
            .slash_meter_replenish_fraction
            .mul_floor(total_power)
            .max(1);
        self.ceiling = ceiling;
        self.floor = floor;
        self.allowance = self.allowance.saturating_add(amount).min(ceiling);
        self.last_replenish = now;
    }
}

/// Entry of the global throttle queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSlashEntry {
    /// Block time the packet was received.
    pub recv_time: Timestamp,
    /// Sending consumer.
    pub chain_id: ChainId,
    /// Transport sequence of the slash packet.
    pub ibc_sequence: u64,
    /// Validator to jail.
    pub provider_addr: ConsAddress,
    /// Address named in the packet, returned as slash ack.
    pub consumer_addr: ConsAddress,
}

/// Packet held in a per-chain throttle queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThrottledPacket {
    /// Queued slash; mirrored by a [`GlobalSlashEntry`].
    Slash(SlashPacketData),
    /// Maturity notification waiting behind a queued slash.
    VscMatured(VscMaturedPacketData),
}
