//! # Provider Parameters
//!
//! Policy parameters of the provider module. Carried in genesis and
//! replaced by governance through `UpdateParams`.

use ccv_types::{CcvError, CcvResult, Fraction};
use serde::{Deserialize, Serialize};

/// One day in seconds.
const DAY: u64 = 24 * 60 * 60;

/// Default timeout for CCV packets sent by the provider (4 weeks).
pub const DEFAULT_CCV_TIMEOUT_PERIOD: u64 = 28 * DAY;

/// Default VSC maturity deadline before a consumer is removed (5 weeks).
pub const DEFAULT_VSC_TIMEOUT_PERIOD: u64 = 35 * DAY;

/// Default slash meter replenish period (1 hour).
pub const DEFAULT_SLASH_METER_REPLENISH_PERIOD: u64 = 60 * 60;

/// Default cap on throttled slash packets held in the global queue.
pub const DEFAULT_MAX_THROTTLED_PACKETS: u64 = 100_000;

/// Default jail duration for downtime infractions (10 minutes).
pub const DEFAULT_DOWNTIME_JAIL_DURATION: u64 = 10 * 60;

/// Provider module parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderParams {
    /// Timeout for every packet sent to a consumer, in seconds.
    pub ccv_timeout_period: u64,
    /// A consumer whose oldest unmatured VSC packet is older than this is removed.
    pub vsc_timeout_period: u64,
    /// Slash meter replenish period, in seconds of block time.
    pub slash_meter_replenish_period: u64,
    /// Fraction of total power added to the allowance each period.
    pub slash_meter_replenish_fraction: Fraction,
    /// Fraction of total power the allowance may reach.
    pub slash_meter_ceiling_fraction: Fraction,
    /// Fraction of total power the allowance may fall below zero.
    pub slash_meter_floor_fraction: Fraction,
    /// Maximum number of slash entries in the global throttle queue.
    pub max_throttled_packets: u64,
    /// Jail duration for downtime.
    pub downtime_jail_duration: u64,
    /// Stake fraction slashed for double signing.
    pub slash_fraction_double_sign: Fraction,
}

impl Default for ProviderParams {
    fn default() -> Self {
        let five_percent = Fraction::percent(5);
        Self {
            ccv_timeout_period: DEFAULT_CCV_TIMEOUT_PERIOD,
            vsc_timeout_period: DEFAULT_VSC_TIMEOUT_PERIOD,
            slash_meter_replenish_period: DEFAULT_SLASH_METER_REPLENISH_PERIOD,
            slash_meter_replenish_fraction: five_percent,
            slash_meter_ceiling_fraction: five_percent,
            slash_meter_floor_fraction: five_percent,
            max_throttled_packets: DEFAULT_MAX_THROTTLED_PACKETS,
            downtime_jail_duration: DEFAULT_DOWNTIME_JAIL_DURATION,
            slash_fraction_double_sign: five_percent,
        }
    }
}

impl ProviderParams {
    /// Validate parameter ranges.
    pub fn validate(&self) -> CcvResult<()> {
        for (name, period) in [
            ("ccv_timeout_period", self.ccv_timeout_period),
            ("vsc_timeout_period", self.vsc_timeout_period),
            (
                "slash_meter_replenish_period",
                self.slash_meter_replenish_period,
            ),
            ("downtime_jail_duration", self.downtime_jail_duration),
        ] {
            if period == 0 {
                return Err(CcvError::InvalidParams(format!("{name} must be positive")));
            }
        }
        for (name, fraction) in [
            (
                "slash_meter_replenish_fraction",
                self.slash_meter_replenish_fraction,
            ),
            (
                "slash_meter_ceiling_fraction",
                self.slash_meter_ceiling_fraction,
            ),
            ("slash_meter_floor_fraction", self.slash_meter_floor_fraction),
            ("slash_fraction_double_sign", self.slash_fraction_double_sign),
        ] {
            if !fraction.is_positive_unit() {
                return Err(CcvError::InvalidParams(format!(
                    "{name} must be in (0, 1], got {fraction}"
                )));
            }
        }
        if self.max_throttled_packets == 0 {
            return Err(CcvError::InvalidParams(
                "max_throttled_packets must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
