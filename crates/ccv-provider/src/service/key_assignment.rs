//! # Key Assignment
//!
//! A validator may sign on a consumer with a key other than its provider
//! key. A consumer key, once used by anyone on a chain, is never reusable
//! by a different identity on that chain.

use super::*;

impl Keeper<'_> {
    pub(crate) fn assign_consumer_key(
        &mut self,
        chain_id: &ChainId,
        provider_addr: &ConsAddress,
        consumer_key: &str,
    ) -> CcvResult<()> {
        let chain = self.store.require_chain(chain_id)?;
        if chain.is_closed() {
            return Err(CcvError::UnknownChain(chain_id.clone()));
        }
        let new_key = ConsensusPubKey::from_json(consumer_key)?;
        let validator = self
            .staking
            .validator_by_cons_addr(provider_addr)
            .ok_or(CcvError::UnknownValidator(*provider_addr))?;

        let current_key = self.consumer_key(chain_id, &validator)?;
        let new_addr = new_key.address();
        let existing = self.store.key_record(chain_id, &new_addr)?;
        let staking_owner = self
            .staking
            .validator_by_cons_addr(&new_addr)
            .map(|v| v.cons_addr);

        let plan = plan_assignment(
            chain_id,
            provider_addr,
            &current_key,
            &new_key,
            existing.as_ref(),
            staking_owner.as_ref(),
        )?;
        let AssignmentPlan::Replace { new_key, old_key } = plan else {
            debug!(
                "[ccv-provider] {} already signs with {} on {}",
                provider_addr, new_addr, chain_id
            );
            return Ok(());
        };

        self.store
            .set_assigned_key(chain_id, provider_addr, &new_key)?;
        self.store.set_key_record(
            chain_id,
            &new_addr,
            &ConsumerAddrRecord {
                provider_addr: *provider_addr,
                consumer_key: new_key,
                status: KeyStatus::Active,
            },
        )?;
        self.store.set_key_record(
            chain_id,
            &old_key.address(),
            &ConsumerAddrRecord {
                provider_addr: *provider_addr,
                consumer_key: old_key,
                status: KeyStatus::replaced(chain.is_launched()),
            },
        )?;
        metrics::record_key_assignment();
        info!(
            "[ccv-provider] {} assigned consumer key {} on {}",
            provider_addr, new_addr, chain_id
        );
        Ok(())
    }

    /// Equivocation on a consumer: slash, jail and tombstone the provider validator.
    pub(crate) fn handle_double_voting(
        &mut self,
        chain_id: &ChainId,
        evidence: &DuplicateVoteEvidence,
    ) -> CcvResult<()> {
        let chain = self.store.require_chain(chain_id)?;
        if !chain.is_launched() {
            return Err(CcvError::InvalidEvidence(format!(
                "consumer chain {chain_id} has not launched"
            )));
        }
        let consumer_addr = evidence.validator_address();
        let (provider_addr, signing_key) = match self.store.key_record(chain_id, &consumer_addr)? {
            Some(record) => (record.provider_addr, record.consumer_key),
            None => {
                let v = self
                    .staking
                    .validator_by_cons_addr(&consumer_addr)
                    .ok_or_else(|| {
                        CcvError::InvalidEvidence(format!("unknown signer {consumer_addr}"))
                    })?;
                (v.cons_addr, v.pub_key)
            }
        };
        evidence.verify(chain_id, &signing_key)?;

        let validator = self
            .staking
            .validator_by_cons_addr(&provider_addr)
            .ok_or(CcvError::UnknownValidator(provider_addr))?;
        if validator.tombstoned {
            return Err(CcvError::InvalidEvidence(format!(
                "validator {provider_addr} is already tombstoned"
            )));
        }
        self.slash_double_sign(&validator, self.ctx.height)
    }
}
