//! # Validator Set Diffs
//!
//! Per block and per established consumer, the provider ranks its bonded
//! validators, translates them through key assignment and diffs the result
//! against the set last sent to that consumer.
//!
//! Ranking order is power descending, then provider address ascending, so
//! every replica selects the same validators under a cap.

use ccv_types::{ConsAddress, ConsensusPubKey, ValidatorUpdate};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// A validator as reported by the staking module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    /// Provider consensus address.
    pub cons_addr: ConsAddress,
    /// Provider consensus key.
    pub pub_key: ConsensusPubKey,
    /// Bonded voting power.
    pub power: i64,
    /// Jailed validators are excluded from every consumer set.
    pub jailed: bool,
    /// Tombstoned validators can never rejoin.
    pub tombstoned: bool,
}

impl ValidatorInfo {
    /// Active, unjailed validator.
    pub fn new(pub_key: ConsensusPubKey, power: i64) -> Self {
        Self {
            cons_addr: pub_key.address(),
            pub_key,
            power,
            jailed: false,
            tombstoned: false,
        }
    }

    /// Power counted for slashing: zero once jailed.
    pub fn slashable_power(&self) -> i64 {
        if self.jailed {
            0
        } else {
            self.power
        }
    }
}

/// A validator as sent to one consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerValidator {
    /// Consumer-side key.
    pub consumer_key: ConsensusPubKey,
    /// Power.
    pub power: i64,
}

/// Consumer validator set keyed by provider address.
pub type ConsumerValidatorSet = BTreeMap<ConsAddress, ConsumerValidator>;

/// Select the validators a consumer should see.
///
/// Drops jailed and zero-power validators and those below `min_power`,
/// sorts by power descending then address ascending, and keeps at most
/// `cap` entries (`0` keeps all).
pub fn rank_validators(validators: Vec<ValidatorInfo>, min_power: i64, cap: u32) -> Vec<ValidatorInfo> {
    let mut ranked: Vec<ValidatorInfo> = validators
        .into_iter()
        .filter(|v| !v.jailed && v.power > 0 && v.power >= min_power)
        .collect();
    ranked.sort_by_key(|v| (Reverse(v.power), v.cons_addr));
    if cap > 0 {
        ranked.truncate(cap as usize);
    }
    ranked
}

/// Updates turning `last` into `next`, sorted by consumer address.
///
/// A key change sends the old key at power `0` and the new key at its power.
pub fn diff_validator_sets(
    last: &ConsumerValidatorSet,
    next: &ConsumerValidatorSet,
) -> Vec<ValidatorUpdate> {
    let mut updates: BTreeMap<ConsAddress, ValidatorUpdate> = BTreeMap::new();
    let mut emit = |key: ConsensusPubKey, power: i64| {
        updates.insert(key.address(), ValidatorUpdate::new(key, power));
    };

    for (provider_addr, old) in last {
        match next.get(provider_addr) {
            None => emit(old.consumer_key, 0),
            Some(new) if new.consumer_key != old.consumer_key => {
                emit(old.consumer_key, 0);
                emit(new.consumer_key, new.power);
            }
            Some(new) if new.power != old.power => emit(new.consumer_key, new.power),
            Some(_) => {}
        }
    }
    for (provider_addr, new) in next {
        if !last.contains_key(provider_addr) {
            emit(new.consumer_key, new.power);
        }
    }

    updates.into_values().collect()
}

/// Full set as updates, sorted by consumer address. Used for consumer genesis.
pub fn initial_updates(set: &ConsumerValidatorSet) -> Vec<ValidatorUpdate> {
    diff_validator_sets(&ConsumerValidatorSet::new(), set)
}
