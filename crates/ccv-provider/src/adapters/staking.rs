use crate::domain::ValidatorInfo;
use crate::ports::StakingKeeper;
use ccv_types::{CcvError, CcvResult, ConsAddress, ConsensusPubKey, Fraction, Timestamp};
use std::collections::{BTreeMap, BTreeSet};

/// A slash applied through [`InMemoryStaking`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashRecord {
    pub addr: ConsAddress,
    pub infraction_height: u64,
    pub power: i64,
    pub fraction: Fraction,
}

/// In-memory staking module.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStaking {
    validators: BTreeMap<ConsAddress, ValidatorInfo>,
    /// Jail release time per validator.
    pub jailed_until: BTreeMap<ConsAddress, Timestamp>,
    /// Slashes in the order they were applied.
    pub slashes: Vec<SlashRecord>,
    /// Unbonding ops currently on hold.
    pub on_hold: BTreeSet<u64>,
    /// Unbonding ops released by the provider, in order.
    pub released: Vec<u64>,
}

impl InMemoryStaking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Staking module with one validator per `(key, power)`.
    pub fn with_validators(validators: impl IntoIterator<Item = (ConsensusPubKey, i64)>) -> Self {
        let mut staking = Self::new();
        for (key, power) in validators {
            staking.add_validator(ValidatorInfo::new(key, power));
        }
        staking
    }

    pub fn add_validator(&mut self, validator: ValidatorInfo) {
        self.validators.insert(validator.cons_addr, validator);
    }

    /// Change bonded power; `0` unbonds the validator fully.
    pub fn set_power(&mut self, addr: &ConsAddress, power: i64) {
        if let Some(v) = self.validators.get_mut(addr) {
            v.power = power;
        }
    }

    pub fn unjail(&mut self, addr: &ConsAddress) {
        if let Some(v) = self.validators.get_mut(addr) {
            if !v.tombstoned {
                v.jailed = false;
            }
        }
        self.jailed_until.remove(addr);
    }

    pub fn validator(&self, addr: &ConsAddress) -> Option<&ValidatorInfo> {
        self.validators.get(addr)
    }

    pub fn is_jailed(&self, addr: &ConsAddress) -> bool {
        self.validators.get(addr).is_some_and(|v| v.jailed)
    }

    fn get_mut(&mut self, addr: &ConsAddress) -> CcvResult<&mut ValidatorInfo> {
        self.validators
            .get_mut(addr)
            .ok_or(CcvError::UnknownValidator(*addr))
    }
}

impl StakingKeeper for InMemoryStaking {
    fn validators_by_power(&self) -> Vec<ValidatorInfo> {
        self.validators
            .values()
            .filter(|v| v.power > 0)
            .cloned()
            .collect()
    }

    fn validator_by_cons_addr(&self, addr: &ConsAddress) -> Option<ValidatorInfo> {
        self.validators.get(addr).cloned()
    }

    fn total_power(&self) -> i64 {
        self.validators
            .values()
            .filter(|v| !v.jailed)
            .map(|v| v.power)
            .sum()
    }

    fn jail(&mut self, addr: &ConsAddress, until: Timestamp) -> CcvResult<()> {
        self.get_mut(addr)?.jailed = true;
        let entry = self.jailed_until.entry(*addr).or_insert(until);
        *entry = (*entry).max(until);
        Ok(())
    }

    fn tombstone(&mut self, addr: &ConsAddress) -> CcvResult<()> {
        let validator = self.get_mut(addr)?;
        validator.tombstoned = true;
        validator.jailed = true;
        self.jailed_until.insert(*addr, Timestamp::MAX);
        Ok(())
    }

    fn slash(
        &mut self,
        addr: &ConsAddress,
        infraction_height: u64,
        power: i64,
        fraction: Fraction,
    ) -> CcvResult<()> {
        let validator = self.get_mut(addr)?;
        validator.power -= fraction.mul_floor(validator.power);
        self.slashes.push(SlashRecord {
            addr: *addr,
            infraction_height,
            power,
            fraction,
        });
        Ok(())
    }

    fn put_unbonding_on_hold(&mut self, op_id: u64) -> CcvResult<()> {
        self.on_hold.insert(op_id);
        Ok(())
    }

    fn unbonding_can_complete(&mut self, op_id: u64) -> CcvResult<()> {
        self.on_hold.remove(&op_id);
        self.released.push(op_id);
        Ok(())
    }
}
