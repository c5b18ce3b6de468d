//! # Keeper
//!
//! Borrowed view over the service's collaborators for the duration of one
//! call. All state transitions are methods on [`Keeper`].

use super::*;

/// One call's write-set, staking module and transport.
pub(crate) struct Keeper<'a> {
    pub(crate) store: &'a mut dyn KeyValueStore,
    pub(crate) staking: &'a mut dyn StakingKeeper,
    pub(crate) transport: &'a mut dyn PacketSender,
    pub(crate) ctx: BlockContext,
    pub(crate) params: ProviderParams,
}

impl Keeper<'_> {
    /// Run `f` on a write-set nested in this one.
    pub(crate) fn nested<R>(&mut self, f: impl FnOnce(&mut Keeper<'_>) -> CcvResult<R>) -> CcvResult<R> {
        let mut cache = CachedKvStore::new(&mut *self.store);
        let result = {
            let mut inner = Keeper {
                store: &mut cache,
                staking: &mut *self.staking,
                transport: &mut *self.transport,
                ctx: self.ctx,
                params: self.params.clone(),
            };
            f(&mut inner)?
        };
        cache.commit()?;
        Ok(result)
    }

    /// Run `f` for one consumer on a nested write-set. An invariant violation
    /// discards that chain's writes and the block carries on.
    pub(crate) fn isolated(
        &mut self,
        chain_id: &ChainId,
        f: impl FnOnce(&mut Keeper<'_>) -> CcvResult<()>,
    ) -> CcvResult<()> {
        match self.nested(f) {
            Err(e) if e.is_invariant_violation() => {
                error!(
                    "[ccv-provider] discarding block update for {}: {}",
                    chain_id, e
                );
                Ok(())
            }
            other => other,
        }
    }

    /// Key `validator` signs with on `chain_id`.
    pub(crate) fn consumer_key(
        &self,
        chain_id: &ChainId,
        validator: &ValidatorInfo,
    ) -> CcvResult<ConsensusPubKey> {
        Ok(self
            .store
            .assigned_key(chain_id, &validator.cons_addr)?
            .unwrap_or(validator.pub_key))
    }

    /// Validator set `chain` should currently see, keyed by provider address.
    ///
    /// Two validators translating to one consumer address is an invariant
    /// violation for the chain.
    pub(crate) fn next_consumer_set(&self, chain: &ConsumerChain) -> CcvResult<ConsumerValidatorSet> {
        let ranked = rank_validators(
            self.staking.validators_by_power(),
            chain.min_power,
            chain.validator_set_cap,
        );
        let mut set = ConsumerValidatorSet::new();
        let mut consumer_addrs = BTreeSet::new();
        for validator in ranked {
            let consumer_key = self.consumer_key(&chain.chain_id, &validator)?;
            if !consumer_addrs.insert(consumer_key.address()) {
                return Err(CcvError::CorruptedState(format!(
                    "consumer address {} used by more than one validator on {}",
                    consumer_key.address(),
                    chain.chain_id
                )));
            }
            set.insert(
                validator.cons_addr,
                ConsumerValidator {
                    consumer_key,
                    power: validator.power,
                },
            );
        }
        Ok(set)
    }

    /// Consumer chain bound to `channel_id`.
    pub(crate) fn chain_for_channel(&self, channel_id: &ChannelId) -> CcvResult<ConsumerChain> {
        let chain_id = self
            .store
            .chain_for_channel(channel_id)?
            .ok_or_else(|| CcvError::UnknownChannel(channel_id.clone()))?;
        self.store.require_chain(&chain_id)
    }

    /// Close the chain's channel and drop its queues. Key records survive.
    pub(crate) fn stop_consumer_chain(&mut self, chain_id: &ChainId, reason: &str) -> CcvResult<()> {
        let mut chain = self.store.require_chain(chain_id)?;
        if chain.is_closed() {
            return Ok(());
        }
        chain.channel.transition_to(chain_id, ChannelState::Closed)?;
        self.store.set_consumer_chain(&chain)?;
        self.store.delete_chain_queues(chain_id)?;

        for op in self.store.unbonding_ops()? {
            if op.owed.contains(chain_id) {
                self.settle_unbonding_op(op.id, chain_id)?;
            }
        }

        metrics::record_consumer_stopped(reason);
        metrics::set_throttle_queue_size(self.store.global_queue_len()?);
        warn!(
            "[ccv-provider] stopped consumer chain {} at height {}: {}",
            chain_id, self.ctx.height, reason
        );
        Ok(())
    }
}

/// Provider validator behind `consumer_addr`, if the key is still attributable.
///
/// Without a record the consumer address is the provider address itself.
pub(crate) fn attributable_provider_addr<S: KeyValueStore + ?Sized>(
    store: &S,
    chain_id: &ChainId,
    consumer_addr: &ConsAddress,
) -> CcvResult<Option<ConsAddress>> {
    Ok(match store.key_record(chain_id, consumer_addr)? {
        Some(record) if record.is_slash_attributable() => Some(record.provider_addr),
        Some(_) => None,
        None => Some(*consumer_addr),
    })
}
