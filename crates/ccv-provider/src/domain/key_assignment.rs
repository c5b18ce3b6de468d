//! # Consumer Key Assignment
//!
//! Each validator may sign on a consumer chain with a key different from its
//! provider consensus key. Two records exist per assignment:
//!
//! - `(chain, provider_addr) → consumer_key` for the active assignment
//! - `(chain, consumer_addr) → ConsumerAddrRecord` for reverse lookups
//!
//! Reverse records are never deleted. A consumer address is bound to the
//! first validator that used it on a chain, forever. Replaced keys go through
//! `Retiring` (still slash-attributable while VSC packets that mention them
//! are in flight) and end `Retired`.

use ccv_types::{CcvError, CcvResult, ChainId, ConsAddress, ConsensusPubKey};
use serde::{Deserialize, Serialize};

/// Lifecycle of a consumer key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyStatus {
    /// Currently assigned.
    Active,
    /// Replaced on a launched chain. `prune_at` is the first VSC id sent
    /// after the replacement; the key retires once that VSC matures.
    Retiring { prune_at: Option<u64> },
    /// No longer used for anything but stickiness.
    Retired,
}

impl KeyStatus {
    /// Status given to a replaced key.
    pub fn replaced(chain_launched: bool) -> Self {
        if chain_launched {
            Self::Retiring { prune_at: None }
        } else {
            Self::Retired
        }
    }
}

/// Reverse record for a consumer address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerAddrRecord {
    /// Owner of the consumer key.
    pub provider_addr: ConsAddress,
    /// The consumer key itself.
    pub consumer_key: ConsensusPubKey,
    /// Lifecycle status.
    pub status: KeyStatus,
}

impl ConsumerAddrRecord {
    /// Slash packets naming this key are attributed to `provider_addr`.
    pub fn is_slash_attributable(&self) -> bool {
        !matches!(self.status, KeyStatus::Retired)
    }

    /// Retiring key whose prune VSC id is `<= matured_id`.
    pub fn prunable_at(&self, matured_id: u64) -> bool {
        matches!(self.status, KeyStatus::Retiring { prune_at: Some(id) } if id <= matured_id)
    }
}

/// What an assignment request does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssignmentPlan {
    /// The key is already the validator's active key.
    Unchanged,
    /// Bind `new_key` and replace `old_key`.
    Replace {
        new_key: ConsensusPubKey,
        old_key: ConsensusPubKey,
    },
}

/// Decide an assignment of `new_key` to `provider_addr` on `chain_id`.
///
/// * `current_key` - the validator's effective key (explicit or identity)
/// * `existing` - reverse record for `new_key`'s address, if any
/// * `staking_owner` - provider validator whose own consensus address equals
///   `new_key`'s address, if any
pub fn plan_assignment(
    chain_id: &ChainId,
    provider_addr: &ConsAddress,
    current_key: &ConsensusPubKey,
    new_key: &ConsensusPubKey,
    existing: Option<&ConsumerAddrRecord>,
    staking_owner: Option<&ConsAddress>,
) -> CcvResult<AssignmentPlan> {
    let already_assigned = || CcvError::AlreadyAssigned {
        chain_id: chain_id.clone(),
        consumer_addr: new_key.address(),
    };

    if let Some(record) = existing {
        let same_active = record.provider_addr == *provider_addr
            && record.status == KeyStatus::Active
            && new_key == current_key;
        return if same_active {
            Ok(AssignmentPlan::Unchanged)
        } else {
            Err(already_assigned())
        };
    }
    if new_key == current_key {
        return Ok(AssignmentPlan::Unchanged);
    }
    if staking_owner.is_some_and(|owner| owner != provider_addr) {
        return Err(already_assigned());
    }
    Ok(AssignmentPlan::Replace {
        new_key: *new_key,
        old_key: *current_key,
    })
}
