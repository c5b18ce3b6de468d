//! # Packet Relay
//!
//! VSC packets from the provider, and acknowledgements and timeouts of the
//! packets the consumer sent.

use super::*;

impl Keeper<'_> {
    /// Record a validator set change. Updates take effect at the end block.
    pub(crate) fn on_recv_vsc_packet(&mut self, packet: &Packet) -> CcvResult<Acknowledgement> {
        self.require_own_channel(&packet.channel_id)?;
        let channel = self.store.channel()?;
        if !channel.is_established() {
            return Err(CcvError::InvalidPacket(format!(
                "channel {} is {:?}",
                packet.channel_id, channel.state
            )));
        }
        let data: VscPacketData = decode_packet(&packet.data)?;
        data.validate()?;

        if self.store.provider_channel()?.is_none() {
            self.store.set_provider_channel(&packet.channel_id)?;
            info!(
                "[ccv-consumer] provider channel set to {} by VSC {}",
                packet.channel_id, data.valset_update_id
            );
        }

        let maturity_time = self.ctx.time.saturating_add(self.params.unbonding_period);
        self.store
            .set_maturity_time(data.valset_update_id, maturity_time)?;
        self.store
            .set_height_vsc_id(self.ctx.height + 1, data.valset_update_id)?;

        for addr in &data.slash_acks {
            self.store.clear_outstanding_downtime(addr)?;
        }

        let mut pending = self.store.pending_changes()?;
        merge_changes(&mut pending, &data.validator_updates);
        self.store.set_pending_changes(&pending)?;

        metrics::record_vsc_packet_received();
        debug!(
            "[ccv-consumer] VSC {} with {} updates and {} slash acks, matures at {}",
            data.valset_update_id,
            data.validator_updates.len(),
            data.slash_acks.len(),
            maturity_time
        );
        Ok(Acknowledgement::success())
    }

    pub(crate) fn on_acknowledgement(
        &mut self,
        packet: &Packet,
        ack: &Acknowledgement,
    ) -> CcvResult<()> {
        self.require_own_channel(&packet.channel_id)?;
        if let Some(in_flight) = self.store.in_flight_slash()? {
            if in_flight.sequence == packet.sequence {
                self.store.set_in_flight_slash(None)?;
            }
        }
        if let Acknowledgement::Error(reason) = ack {
            return self.close_channel(&format!(
                "provider rejected packet {}: {}",
                packet.sequence, reason
            ));
        }
        debug!("[ccv-consumer] packet {} acknowledged", packet.sequence);
        Ok(())
    }

    /// Put the timed-out packet back at the head of the queue.
    pub(crate) fn on_timeout(&mut self, packet: &Packet) -> CcvResult<()> {
        self.require_own_channel(&packet.channel_id)?;
        let data: ConsumerPacketData = decode_packet(&packet.data)?;
        if let Some(in_flight) = self.store.in_flight_slash()? {
            if in_flight.sequence == packet.sequence {
                self.store.set_in_flight_slash(None)?;
            }
        }
        let mut pending = self.store.pending_packets()?;
        pending.insert(0, data.clone());
        self.store.set_pending_packets(&pending)?;
        metrics::set_pending_packets(pending.len());
        warn!(
            "[ccv-consumer] {} packet {} timed out, requeued",
            data.kind(),
            packet.sequence
        );
        Ok(())
    }
}
