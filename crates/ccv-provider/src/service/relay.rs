//! # Packet Relay
//!
//! Packets from consumers, and acknowledgements and timeouts of the VSC
//! packets the provider sent.

use super::*;

impl Keeper<'_> {
    /// Handle a consumer packet. Validation and policy errors become error
    /// acknowledgements in the service.
    pub(crate) fn on_recv_packet(&mut self, packet: &Packet) -> CcvResult<Acknowledgement> {
        let chain = self.chain_for_channel(&packet.channel_id)?;
        if !chain.is_established() {
            return Err(CcvError::InvalidPacket(format!(
                "channel {} of {} is not established",
                packet.channel_id, chain.chain_id
            )));
        }
        let data: ConsumerPacketData = decode_packet(&packet.data)?;
        data.validate()?;
        debug!(
            "[ccv-provider] received {} packet {} from {}",
            data.kind(),
            packet.sequence,
            chain.chain_id
        );
        match data {
            ConsumerPacketData::Slash(slash) => self.on_slash_packet(&chain, packet.sequence, slash),
            ConsumerPacketData::VscMatured(matured) => {
                self.on_vsc_matured_packet(&chain.chain_id, packet.sequence, matured)
            }
        }
    }

    fn on_vsc_matured_packet(
        &mut self,
        chain_id: &ChainId,
        sequence: u64,
        data: VscMaturedPacketData,
    ) -> CcvResult<Acknowledgement> {
        if !self.store.throttled_packets(chain_id)?.is_empty() {
            self.store
                .push_throttled_packet(chain_id, sequence, &ThrottledPacket::VscMatured(data))?;
            debug!(
                "[ccv-provider] VSC {} maturity from {} waits behind throttled slashes",
                data.valset_update_id, chain_id
            );
        } else {
            self.handle_vsc_matured(chain_id, data.valset_update_id)?;
        }
        Ok(Acknowledgement::success())
    }

    /// The consumer finished unbonding everything up to `vsc_id`.
    pub(crate) fn handle_vsc_matured(&mut self, chain_id: &ChainId, vsc_id: u64) -> CcvResult<()> {
        for (id, op_ids) in self.store.unbonding_index(chain_id)? {
            if id > vsc_id {
                break;
            }
            for op_id in op_ids {
                self.settle_unbonding_op(op_id, chain_id)?;
            }
            self.store.set_unbonding_index(chain_id, id, &[])?;
        }

        for (consumer_addr, mut record) in self.store.key_records(chain_id)? {
            if record.prunable_at(vsc_id) {
                record.status = KeyStatus::Retired;
                self.store.set_key_record(chain_id, &consumer_addr, &record)?;
            }
        }

        for (id, _) in self.store.vsc_send_times(chain_id)? {
            if id > vsc_id {
                break;
            }
            self.store.delete_vsc_send_time(chain_id, id)?;
        }

        let latest = self.store.latest_matured_vsc_id(chain_id)?.max(vsc_id);
        self.store.set_latest_matured_vsc_id(chain_id, latest)?;
        self.prune_vsc_id_heights()?;
        debug!("[ccv-provider] VSC {} matured on {}", vsc_id, chain_id);
        Ok(())
    }

    /// Drop height mappings no running consumer can still reference.
    fn prune_vsc_id_heights(&mut self) -> CcvResult<()> {
        let mut min_matured: Option<u64> = None;
        for chain in self.store.consumer_chains()? {
            if chain.is_running() {
                let latest = self.store.latest_matured_vsc_id(&chain.chain_id)?;
                min_matured = Some(min_matured.map_or(latest, |m| m.min(latest)));
            }
        }
        match min_matured {
            Some(id) if id > 0 => self.store.prune_vsc_id_heights_below(id),
            _ => Ok(()),
        }
    }

    /// The consumer acknowledged a VSC packet. An error ack removes the chain.
    pub(crate) fn on_acknowledgement(
        &mut self,
        packet: &Packet,
        ack: &Acknowledgement,
    ) -> CcvResult<()> {
        let chain = self.chain_for_channel(&packet.channel_id)?;
        match ack {
            Acknowledgement::Result(_) => {
                debug!(
                    "[ccv-provider] packet {} acknowledged by {}",
                    packet.sequence, chain.chain_id
                );
                Ok(())
            }
            Acknowledgement::Error(reason) => {
                warn!(
                    "[ccv-provider] {} rejected packet {}: {}",
                    chain.chain_id, packet.sequence, reason
                );
                self.stop_consumer_chain(&chain.chain_id, "error_ack")
            }
        }
    }

    pub(crate) fn on_timeout(&mut self, packet: &Packet) -> CcvResult<()> {
        let chain = self.chain_for_channel(&packet.channel_id)?;
        self.stop_consumer_chain(&chain.chain_id, "packet_timeout")
    }
}
