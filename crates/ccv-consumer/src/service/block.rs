//! # Block Steps

use super::*;

impl Keeper<'_> {
    pub(crate) fn begin_block(&mut self) -> CcvResult<()> {
        if self.store.channel()?.state.is_terminal() {
            error!(
                "[ccv-consumer] CCV channel of {} is closed, the chain is no longer secured by the provider",
                self.chain_id
            );
        }
        let current = self.vsc_id_at(self.ctx.height)?;
        self.store.set_height_vsc_id(self.ctx.height + 1, current)
    }

    pub(crate) fn end_block(&mut self) -> CcvResult<Vec<ValidatorUpdate>> {
        if self.store.is_pre_ccv()? {
            return self.changeover();
        }
        self.queue_matured_packets()?;
        self.send_pending_packets()?;
        self.flush_pending_changes()
    }

    /// Hand consensus over from the standalone validators to the provider's
    /// initial set.
    fn changeover(&mut self) -> CcvResult<Vec<ValidatorUpdate>> {
        let initial = self.store.initial_val_set()?;
        let updates = changeover_updates(&initial, &self.store.standalone_validators()?);
        let mut set = CrossChainValidatorSet::new();
        apply_changes(&mut set, &initial);
        self.store.set_cross_chain_validators(&set)?;
        self.store.set_pre_ccv(false)?;
        self.store.set_standalone_validators(&[])?;
        metrics::set_validator_count(set.len());
        info!(
            "[ccv-consumer] {} changed over to {} provider validators at height {}",
            self.chain_id,
            set.len(),
            self.ctx.height
        );
        Ok(updates)
    }

    /// Queue a maturity notification for every elapsed VSC, in id order.
    fn queue_matured_packets(&mut self) -> CcvResult<()> {
        let mut latest_matured = None;
        for (vsc_id, maturity_time) in self.store.maturing_vscs()? {
            if maturity_time > self.ctx.time {
                break;
            }
            self.store
                .push_pending_packet(ConsumerPacketData::VscMatured(VscMaturedPacketData {
                    valset_update_id: vsc_id,
                }))?;
            self.store.delete_maturity_time(vsc_id)?;
            latest_matured = Some(vsc_id);
            debug!("[ccv-consumer] VSC {} matured", vsc_id);
        }

        if let Some(latest) = latest_matured {
            for (height, vsc_id) in self.store.height_vsc_ids()? {
                if vsc_id < latest {
                    self.store.delete_height_vsc_id(height)?;
                }
            }
        }
        Ok(())
    }

    /// Send queued packets in order. Sending stops behind a slash packet
    /// until its acknowledgement arrives.
    fn send_pending_packets(&mut self) -> CcvResult<()> {
        let Some(channel_id) = self.store.provider_channel()? else {
            return Ok(());
        };
        if !self.store.channel()?.is_established() || self.store.in_flight_slash()?.is_some() {
            return Ok(());
        }

        let mut pending = self.store.pending_packets()?.into_iter();
        let mut remaining = Vec::new();
        let timeout = self.ctx.time.saturating_add(self.params.ccv_timeout_period);
        for data in pending.by_ref() {
            let bytes = encode_packet(&data)?;
            match self.transport.send_packet(&channel_id, bytes, timeout) {
                Ok(sequence) => {
                    metrics::record_packet_sent(data.kind());
                    debug!(
                        "[ccv-consumer] sent {} packet {} on {}",
                        data.kind(),
                        sequence,
                        channel_id
                    );
                    if matches!(data, ConsumerPacketData::Slash(_)) {
                        self.store
                            .set_in_flight_slash(Some(&InFlightPacket { sequence, data }))?;
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Transport => {
                    warn!("[ccv-consumer] send failed, keeping packets queued: {}", e);
                    remaining.push(data);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        remaining.extend(pending);
        self.store.set_pending_packets(&remaining)?;
        metrics::set_pending_packets(remaining.len());
        Ok(())
    }

    /// Apply accumulated changes to the cross-chain set and return them for
    /// consensus, sorted by address.
    fn flush_pending_changes(&mut self) -> CcvResult<Vec<ValidatorUpdate>> {
        let pending = self.store.pending_changes()?;
        if pending.is_empty() {
            return Ok(Vec::new());
        }
        let updates: Vec<ValidatorUpdate> = pending.into_values().collect();
        let mut set = self.store.cross_chain_validators()?;
        apply_changes(&mut set, &updates);
        self.store.set_cross_chain_validators(&set)?;
        self.store.set_pending_changes(&BTreeMap::new())?;
        metrics::set_validator_count(set.len());
        Ok(updates)
    }
}
