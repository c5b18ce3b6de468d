//! # Unbonding Hold
//!
//! Staking hook: unbonding operations wait for every established consumer
//! to report maturity of the VSC that carried the change.

use super::*;

impl Keeper<'_> {
    /// Returns true if the operation was put on hold.
    pub(crate) fn after_unbonding_initiated(
        &mut self,
        op_id: u64,
        validator: ConsAddress,
    ) -> CcvResult<bool> {
        let owed: BTreeSet<ChainId> = self
            .store
            .consumer_chains()?
            .into_iter()
            .filter(|c| c.is_established())
            .map(|c| c.chain_id)
            .collect();
        if owed.is_empty() {
            return Ok(false);
        }

        let vsc_id = self.store.valset_update_id()?;
        for chain_id in &owed {
            let mut op_ids = self.store.unbonding_index_at(chain_id, vsc_id)?;
            op_ids.push(op_id);
            self.store.set_unbonding_index(chain_id, vsc_id, &op_ids)?;
        }
        debug!(
            "[ccv-provider] unbonding op {} of {} held for {} consumers at VSC {}",
            op_id,
            validator,
            owed.len(),
            vsc_id
        );
        self.store
            .set_unbonding_op(&UnbondingOp::new(op_id, validator, owed))?;
        self.staking.put_unbonding_on_hold(op_id)?;
        Ok(true)
    }

    /// `chain_id` no longer owes maturity for `op_id`.
    pub(crate) fn settle_unbonding_op(&mut self, op_id: u64, chain_id: &ChainId) -> CcvResult<()> {
        let Some(mut op) = self.store.unbonding_op(op_id)? else {
            return Ok(());
        };
        if op.settle(chain_id) {
            self.store.delete_unbonding_op(op_id)?;
            self.staking.unbonding_can_complete(op_id)?;
            debug!("[ccv-provider] unbonding op {} released", op_id);
            Ok(())
        } else {
            self.store.set_unbonding_op(&op)
        }
    }
}
