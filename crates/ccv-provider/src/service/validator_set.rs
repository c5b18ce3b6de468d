//! # Validator Set Updates
//!
//! `end_block`: per established consumer, queue a VSC packet when the
//! translated set changed (or slash acks / unbonding ops need carrying),
//! enforce the VSC timeout, and hand pending packets to the transport.

use super::*;

impl Keeper<'_> {
    pub(crate) fn end_block(&mut self) -> CcvResult<()> {
        let vsc_id = self.store.valset_update_id()?;
        for chain in self.store.consumer_chains()? {
            if !chain.is_established() {
                continue;
            }
            let chain_id = chain.chain_id.clone();
            self.isolated(&chain_id, |k| {
                k.queue_vsc_packet(&chain, vsc_id)?;
                if k.vsc_timed_out(&chain_id)? {
                    return k.stop_consumer_chain(&chain_id, "vsc_timeout");
                }
                k.send_pending_packets(&chain)
            })?;
        }

        self.store.set_vsc_id_height(vsc_id, self.ctx.height + 1)?;
        self.store.set_valset_update_id(vsc_id + 1)?;
        debug!(
            "[ccv-provider] end block {}: valset update id {} -> {}",
            self.ctx.height,
            vsc_id,
            vsc_id + 1
        );
        Ok(())
    }

    fn queue_vsc_packet(&mut self, chain: &ConsumerChain, vsc_id: u64) -> CcvResult<()> {
        let chain_id = &chain.chain_id;
        let last_sent = self.store.last_sent(chain_id)?;
        let next = self.next_consumer_set(chain)?;
        let updates = diff_validator_sets(&last_sent, &next);
        let slash_acks = self.store.slash_acks(chain_id)?;
        let carries_unbonding = !self.store.unbonding_index_at(chain_id, vsc_id)?.is_empty();
        if updates.is_empty() && slash_acks.is_empty() && !carries_unbonding {
            return Ok(());
        }

        self.schedule_key_pruning(chain_id, vsc_id)?;
        let packet = VscPacketData::new(updates, vsc_id, slash_acks);
        debug!(
            "[ccv-provider] queued VSC {} for {}: {} updates, {} slash acks",
            vsc_id,
            chain_id,
            packet.validator_updates.len(),
            packet.slash_acks.len()
        );
        self.store.append_pending_vsc_packet(chain_id, &packet)?;
        self.store.set_last_sent(chain_id, &next)?;
        self.store.set_slash_acks(chain_id, &[])
    }

    /// Replaced keys stop being attributable once `vsc_id` matures.
    fn schedule_key_pruning(&mut self, chain_id: &ChainId, vsc_id: u64) -> CcvResult<()> {
        for (consumer_addr, mut record) in self.store.key_records(chain_id)? {
            if record.status == (KeyStatus::Retiring { prune_at: None }) {
                record.status = KeyStatus::Retiring {
                    prune_at: Some(vsc_id),
                };
                self.store.set_key_record(chain_id, &consumer_addr, &record)?;
            }
        }
        Ok(())
    }

    /// True if the oldest unmatured VSC packet is older than the VSC timeout.
    fn vsc_timed_out(&self, chain_id: &ChainId) -> CcvResult<bool> {
        let oldest = self.store.vsc_send_times(chain_id)?.into_iter().next();
        Ok(match oldest {
            Some((vsc_id, sent_at)) => {
                let expired = sent_at.saturating_add(self.params.vsc_timeout_period) < self.ctx.time;
                if expired {
                    warn!(
                        "[ccv-provider] VSC {} sent to {} at {} did not mature in time",
                        vsc_id, chain_id, sent_at
                    );
                }
                expired
            }
            None => false,
        })
    }

    /// Send queued packets in id order. A transport failure leaves the rest
    /// queued for the next block.
    fn send_pending_packets(&mut self, chain: &ConsumerChain) -> CcvResult<()> {
        let Some(channel_id) = chain.channel.channel_id.clone() else {
            return Ok(());
        };
        let chain_id = &chain.chain_id;
        let timeout = self.ctx.time.saturating_add(self.params.ccv_timeout_period);
        for packet in self.store.pending_vsc_packets(chain_id)? {
            let data = encode_packet(&packet)?;
            match self.transport.send_packet(&channel_id, data, timeout) {
                Ok(sequence) => {
                    self.store
                        .delete_pending_vsc_packet(chain_id, packet.valset_update_id)?;
                    self.store
                        .set_vsc_send_time(chain_id, packet.valset_update_id, self.ctx.time)?;
                    metrics::record_vsc_packet_sent();
                    debug!(
                        "[ccv-provider] sent VSC {} to {} (sequence {})",
                        packet.valset_update_id, chain_id, sequence
                    );
                }
                Err(e) if e.kind() == ErrorKind::Transport => {
                    warn!(
                        "[ccv-provider] sending VSC {} to {} failed, retrying next block: {}",
                        packet.valset_update_id, chain_id, e
                    );
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
