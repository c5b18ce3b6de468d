//! # Outbound Ports
//!
//! Collaborators the provider module drives: the host staking/slashing
//! module and the packet transport.

use crate::domain::ValidatorInfo;
use ccv_types::{CcvResult, ConsAddress, Fraction, Timestamp};

pub use ccv_types::PacketSender;

/// Host staking and slashing module.
pub trait StakingKeeper {
    /// Bonded validators. Order is not relied upon.
    fn validators_by_power(&self) -> Vec<ValidatorInfo>;

    /// Validator by provider consensus address.
    fn validator_by_cons_addr(&self, addr: &ConsAddress) -> Option<ValidatorInfo>;

    /// Total bonded power.
    fn total_power(&self) -> i64;

    /// Jail until `until` (block time).
    fn jail(&mut self, addr: &ConsAddress, until: Timestamp) -> CcvResult<()>;

    /// Permanently bar the validator from the active set.
    fn tombstone(&mut self, addr: &ConsAddress) -> CcvResult<()>;

    /// Slash `fraction` of the stake that was bonded at `infraction_height`.
    fn slash(
        &mut self,
        addr: &ConsAddress,
        infraction_height: u64,
        power: i64,
        fraction: Fraction,
    ) -> CcvResult<()>;

    /// Keep the unbonding operation from completing.
    fn put_unbonding_on_hold(&mut self, op_id: u64) -> CcvResult<()>;

    /// Release a held unbonding operation.
    fn unbonding_can_complete(&mut self, op_id: u64) -> CcvResult<()>;
}
