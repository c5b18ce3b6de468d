//! # Consumer API Implementation

use super::*;

impl<S, T> ConsumerApi for ConsumerService<S, T>
where
    S: KeyValueStore,
    T: PacketSender,
{
    fn init_genesis(
        &mut self,
        ctx: BlockContext,
        genesis: ConsumerGenesis,
    ) -> CcvResult<Vec<ValidatorUpdate>> {
        genesis.validate()?;
        self.with_keeper(ctx, |k| k.init_genesis(genesis))
    }

    fn export_genesis(&self) -> CcvResult<ConsumerGenesis> {
        genesis::export_genesis(&self.store)
    }

    fn begin_block(&mut self, ctx: BlockContext) -> CcvResult<()> {
        self.with_keeper(ctx, |k| k.begin_block())
    }

    fn end_block(&mut self, ctx: BlockContext) -> CcvResult<Vec<ValidatorUpdate>> {
        self.with_keeper(ctx, |k| k.end_block())
    }

    fn handle_event(
        &mut self,
        ctx: BlockContext,
        event: TransportEvent,
    ) -> CcvResult<Option<Acknowledgement>> {
        match event {
            TransportEvent::ChanOpenTry { .. } | TransportEvent::ChanOpenConfirm { .. } => {
                Err(CcvError::InvalidHandshake(
                    "the consumer initiates the CCV channel".to_string(),
                ))
            }
            TransportEvent::ChanOpenInit {
                channel_id,
                port_id,
                order,
                version,
                client_id,
            } => self
                .with_keeper(ctx, |k| {
                    k.on_chan_open_init(channel_id, &port_id, order, &version, &client_id)
                })
                .map(|_| None),
            TransportEvent::ChanOpenAck {
                channel_id,
                counterparty_version,
            } => self
                .with_keeper(ctx, |k| k.on_chan_open_ack(&channel_id, &counterparty_version))
                .map(|_| None),
            TransportEvent::ChanCloseInit { channel_id } => {
                Err(CcvError::CloseNotAllowed(channel_id))
            }
            TransportEvent::ChanCloseConfirm { channel_id } => self
                .with_keeper(ctx, |k| k.on_chan_close_confirm(&channel_id))
                .map(|_| None),
            TransportEvent::RecvPacket(packet) => {
                match self.with_keeper(ctx, |k| k.on_recv_vsc_packet(&packet)) {
                    Ok(ack) => Ok(Some(ack)),
                    Err(e) if matches!(e.kind(), ErrorKind::Validation | ErrorKind::Policy) => {
                        warn!(
                            "[ccv-consumer] rejecting packet {} on {}: {}",
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

    fn slash(
        &mut self,
        ctx: BlockContext,
        addr: ConsAddress,
        power: i64,
        infraction_height: u64,
        infraction: Infraction,
    ) -> CcvResult<()> {
        self.with_keeper(ctx, |k| {
            k.queue_slash(addr, power, infraction_height, infraction)
        })
    }

    fn is_message_allowed(&self, chain_id: &ChainId, type_url: &str) -> CcvResult<bool> {
        let established = self.store.channel()?.is_established();
        Ok(is_message_allowed(
            &self.chain_id,
            chain_id,
            type_url,
            established,
        ))
    }

    fn channel_state(&self) -> CcvResult<ChannelState> {
        Ok(self.store.channel()?.state)
    }
}
