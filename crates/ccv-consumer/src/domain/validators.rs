//! # Cross-Chain Validators
//!
//! The consumer's view of its validator set: updates received from the
//! provider are merged by consumer address and handed to consensus at the
//! end of the block.

use ccv_types::{ConsAddress, ConsensusPubKey, ValidatorUpdate};
use std::collections::BTreeMap;

/// Current validators keyed by consumer address.
pub type CrossChainValidatorSet = BTreeMap<ConsAddress, ValidatorUpdate>;

/// Merge `updates` into `pending`; a later update for an address replaces
/// the earlier one.
pub fn merge_changes(pending: &mut BTreeMap<ConsAddress, ValidatorUpdate>, updates: &[ValidatorUpdate]) {
    for update in updates {
        pending.insert(update.address(), update.clone());
    }
}

/// Apply updates to the set: power `0` removes.
pub fn apply_changes(set: &mut CrossChainValidatorSet, updates: &[ValidatorUpdate]) {
    for update in updates {
        if update.power == 0 {
            set.remove(&update.address());
        } else {
            set.insert(update.address(), update.clone());
        }
    }
}

/// Updates handing consensus from a standalone chain's validators to the
/// provider's: the full initial set plus power `0` for every standalone key
/// not in it. Sorted by address.
pub fn changeover_updates(
    initial: &[ValidatorUpdate],
    standalone: &[ConsensusPubKey],
) -> Vec<ValidatorUpdate> {
    let mut updates: BTreeMap<ConsAddress, ValidatorUpdate> = initial
        .iter()
        .map(|u| (u.address(), u.clone()))
        .collect();
    for key in standalone {
        updates
            .entry(key.address())
            .or_insert_with(|| ValidatorUpdate::new(*key, 0));
    }
    updates.into_values().collect()
}
