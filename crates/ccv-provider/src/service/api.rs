//! # Provider API Implementation

use super::*;

impl<S, K, T> ProviderApi for ProviderService<S, K, T>
where
    S: KeyValueStore,
    K: StakingKeeper,
    T: PacketSender,
{
    fn init_genesis(&mut self, ctx: BlockContext, genesis: ProviderGenesis) -> CcvResult<()> {
        genesis.validate()?;
        self.with_keeper(ctx, |k| k.init_genesis(genesis))
    }

    fn export_genesis(&self) -> CcvResult<ProviderGenesis> {
        genesis::export_genesis(&self.store)
    }

    fn begin_block(&mut self, ctx: BlockContext) -> CcvResult<()> {
        self.with_keeper(ctx, |k| {
            k.launch_and_stop_chains()?;
            k.run_throttle()
        })
    }

    fn end_block(&mut self, ctx: BlockContext) -> CcvResult<()> {
        self.with_keeper(ctx, |k| k.end_block())
    }

    fn handle_msg(&mut self, ctx: BlockContext, msg: ProviderMsg) -> CcvResult<()> {
        let type_url = msg.type_url();
        self.with_keeper(ctx, |k| k.handle_msg(msg)).map_err(|e| {
            debug!("[ccv-provider] rejected {}: {}", type_url, e);
            e
        })
    }

    fn handle_event(
        &mut self,
        ctx: BlockContext,
        event: TransportEvent,
    ) -> CcvResult<Option<Acknowledgement>> {
        match event {
            TransportEvent::ChanOpenInit { .. } | TransportEvent::ChanOpenAck { .. } => {
                Err(CcvError::InvalidHandshake(
                    "the provider never initiates a CCV channel".to_string(),
                ))
            }
            TransportEvent::ChanOpenTry {
                chain_id,
                channel_id,
                port_id,
                order,
                version,
                client_id,
            } => self
                .with_keeper(ctx, |k| {
                    k.on_chan_open_try(chain_id, channel_id, &port_id, order, &version, &client_id)
                })
                .map(|_| None),
            TransportEvent::ChanOpenConfirm { channel_id } => self
                .with_keeper(ctx, |k| k.on_chan_open_confirm(&channel_id))
                .map(|_| None),
            TransportEvent::ChanCloseInit { channel_id } => {
                Err(CcvError::CloseNotAllowed(channel_id))
            }
            TransportEvent::ChanCloseConfirm { channel_id } => self
                .with_keeper(ctx, |k| k.on_chan_close_confirm(&channel_id))
                .map(|_| None),
            TransportEvent::RecvPacket(packet) => {
                match self.with_keeper(ctx, |k| k.on_recv_packet(&packet)) {
                    Ok(ack) => Ok(Some(ack)),
                    Err(e) if matches!(e.kind(), ErrorKind::Validation | ErrorKind::Policy) => {
                        warn!(
                            "[ccv-provider] rejecting packet {} on {}: {}",
                            packet.sequence, packet.channel_id, e
                        );
                        Ok(Some(Acknowledgement::error(e)))
                    }
                    Err(e) => Err(e),
                }
            }
            TransportEvent::Acknowledgement { packet, ack } => self
                .with_keeper(ctx, |k| k.on_acknowledgement(&packet, &ack))
                .map(|_| None),
            TransportEvent::Timeout(packet) => self
                .with_keeper(ctx, |k| k.on_timeout(&packet))
                .map(|_| None),
        }
    }

    fn after_unbonding_initiated(
        &mut self,
        ctx: BlockContext,
        op_id: u64,
        validator: ConsAddress,
    ) -> CcvResult<bool> {
        self.with_keeper(ctx, |k| k.after_unbonding_initiated(op_id, validator))
    }

    fn before_validator_created(&self, cons_addr: &ConsAddress) -> CcvResult<()> {
        for chain in self.store.consumer_chains()? {
            let in_use = self
                .store
                .key_record(&chain.chain_id, cons_addr)?
                .is_some_and(|record| record.provider_addr != *cons_addr);
            if in_use {
                warn!(
                    "[ccv-provider] refusing validator {}: consumer key on {}",
                    cons_addr, chain.chain_id
                );
                return Err(CcvError::ConsensusKeyInUse(*cons_addr));
            }
        }
        Ok(())
    }

    fn can_complete(&self, op_id: u64) -> CcvResult<bool> {
        Ok(self
            .store
            .unbonding_op(op_id)?
            .map_or(true, |op| op.is_complete()))
    }

    fn consumer_addr(
        &self,
        chain_id: &ChainId,
        provider_addr: &ConsAddress,
    ) -> CcvResult<ConsAddress> {
        self.store.require_chain(chain_id)?;
        Ok(self
            .store
            .assigned_key(chain_id, provider_addr)?
            .map(|key| key.address())
            .unwrap_or(*provider_addr))
    }

    fn provider_addr(
        &self,
        chain_id: &ChainId,
        consumer_addr: &ConsAddress,
    ) -> CcvResult<Option<ConsAddress>> {
        self.store.require_chain(chain_id)?;
        Ok(attributable_provider_addr(&self.store, chain_id, consumer_addr)?
            .filter(|addr| self.staking.validator_by_cons_addr(addr).is_some()))
    }

    fn channel_state(&self, chain_id: &ChainId) -> CcvResult<ChannelState> {
        Ok(self.store.require_chain(chain_id)?.state())
    }
}
