//! # Unbonding Operations
//!
//! An unbonding operation that starts while consumers are established may
//! only complete after each of them acknowledged maturity of the VSC that
//! carried the power reduction.

use ccv_types::{ChainId, ConsAddress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unbonding operation waiting on consumer maturity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingOp {
    /// Staking-module operation id.
    pub id: u64,
    /// Validator whose stake is unbonding.
    pub validator: ConsAddress,
    /// Consumers that still owe a maturity notification.
    pub owed: BTreeSet<ChainId>,
}

impl UnbondingOp {
    pub fn new(id: u64, validator: ConsAddress, owed: BTreeSet<ChainId>) -> Self {
        Self {
            id,
            validator,
            owed,
        }
    }

    /// Drop `chain_id` from the owed set. Returns true if the op is now complete.
    pub fn settle(&mut self, chain_id: &ChainId) -> bool {
        self.owed.remove(chain_id);
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.owed.is_empty()
    }
}
