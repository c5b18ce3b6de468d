//! # Consumer Parameters

use ccv_types::{CcvError, CcvResult};
use serde::{Deserialize, Serialize};

const DAY: u64 = 24 * 60 * 60;

/// Default timeout for packets sent to the provider (4 weeks).
pub const DEFAULT_CCV_TIMEOUT_PERIOD: u64 = 28 * DAY;

/// Default consumer unbonding period (3 weeks).
pub const DEFAULT_UNBONDING_PERIOD: u64 = 21 * DAY;

/// Consumer module parameters, set by the provider at launch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerParams {
    /// Timeout for every packet sent to the provider, in seconds.
    pub ccv_timeout_period: u64,
    /// A received VSC matures this many seconds after it was applied.
    pub unbonding_period: u64,
}

impl Default for ConsumerParams {
    fn default() -> Self {
        Self {
            ccv_timeout_period: DEFAULT_CCV_TIMEOUT_PERIOD,
            unbonding_period: DEFAULT_UNBONDING_PERIOD,
        }
    }
}

impl ConsumerParams {
    pub fn validate(&self) -> CcvResult<()> {
        if self.ccv_timeout_period == 0 {
            return Err(CcvError::InvalidParams(
                "ccv_timeout_period must be positive".to_string(),
            ));
        }
        if self.unbonding_period == 0 {
            return Err(CcvError::InvalidParams(
                "unbonding_period must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
