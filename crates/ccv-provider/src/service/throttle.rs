//! # Slash Handling and Throttling
//!
//! Double-sign requests are applied immediately. Downtime requests pass
//! through the slash meter; when it is exhausted, or anything is already
//! waiting, they join the global FIFO queue, mirrored per chain so that a
//! chain's later `VscMatured` packets stay behind its pending slashes.

use super::*;

impl Keeper<'_> {
    /// Lazily create the meter, replenish it when due, then drain the queue head-first.
    pub(crate) fn run_throttle(&mut self) -> CcvResult<()> {
        let mut meter = self.current_slash_meter()?;
        if meter.replenish_due(self.ctx.time, self.params.slash_meter_replenish_period) {
            meter.replenish(self.staking.total_power(), &self.params, self.ctx.time);
            debug!(
                "[ccv-provider] slash meter replenished: allowance {} (ceiling {}, floor {})",
                meter.allowance, meter.ceiling, meter.floor
            );
        }
        self.drain_throttle_queue(&mut meter)?;
        self.store.set_slash_meter(&meter)?;
        metrics::set_slash_meter_allowance(meter.allowance);
        Ok(())
    }

    fn current_slash_meter(&self) -> CcvResult<SlashMeter> {
        Ok(match self.store.slash_meter()? {
            Some(meter) => meter,
            None => SlashMeter::new(self.staking.total_power(), &self.params, self.ctx.time),
        })
    }

    fn drain_throttle_queue(&mut self, meter: &mut SlashMeter) -> CcvResult<()> {
        for (position, entry) in self.store.global_slash_queue()? {
            let power = self
                .staking
                .validator_by_cons_addr(&entry.provider_addr)
                .map(|v| v.slashable_power())
                .unwrap_or(0);
            if meter.allow(power) == ThrottleDecision::Queue {
                break;
            }
            self.store.delete_global_slash(position)?;
            self.store
                .delete_throttled_packet(&entry.chain_id, entry.ibc_sequence)?;
            self.jail_for_downtime(&entry.provider_addr)?;
            self.store
                .append_slash_ack(&entry.chain_id, entry.consumer_addr)?;
            info!(
                "[ccv-provider] applied throttled downtime slash of {} from {}",
                entry.provider_addr, entry.chain_id
            );
            self.release_matured_behind(&entry.chain_id)?;
        }
        metrics::set_throttle_queue_size(self.store.global_queue_len()?);
        Ok(())
    }

    /// Handle `VscMatured` packets at the head of the chain's queue, up to its next slash.
    fn release_matured_behind(&mut self, chain_id: &ChainId) -> CcvResult<()> {
        for (sequence, packet) in self.store.throttled_packets(chain_id)? {
            match packet {
                ThrottledPacket::Slash(_) => break,
                ThrottledPacket::VscMatured(data) => {
                    self.store.delete_throttled_packet(chain_id, sequence)?;
                    self.handle_vsc_matured(chain_id, data.valset_update_id)?;
                }
            }
        }
        Ok(())
    }

    /// Provider height the consumer's `vsc_id` refers to.
    fn infraction_height(&self, chain: &ConsumerChain, vsc_id: u64) -> CcvResult<u64> {
        let height = if vsc_id == 0 {
            chain.launch.as_ref().map(|l| l.launch_height)
        } else {
            self.store.vsc_id_height(vsc_id)?
        };
        height.ok_or_else(|| CcvError::UnknownVscId {
            chain_id: chain.chain_id.clone(),
            vsc_id,
        })
    }

    pub(crate) fn on_slash_packet(
        &mut self,
        chain: &ConsumerChain,
        sequence: u64,
        data: SlashPacketData,
    ) -> CcvResult<Acknowledgement> {
        let chain_id = &chain.chain_id;
        let infraction = infraction_label(data.infraction);
        let infraction_height = self.infraction_height(chain, data.valset_update_id)?;
        let consumer_addr = data.validator.address;

        let validator = attributable_provider_addr(&*self.store, chain_id, &consumer_addr)?
            .and_then(|addr| self.staking.validator_by_cons_addr(&addr));
        let validator = match validator {
            Some(v) if !v.tombstoned => v,
            _ => {
                warn!(
                    "[ccv-provider] ignoring {} slash request from {} for {}: no slashable validator",
                    infraction, chain_id, consumer_addr
                );
                metrics::record_slash_packet(infraction, "ignored");
                return Ok(Acknowledgement::success());
            }
        };

        match data.infraction {
            Infraction::DoubleSign => {
                self.slash_double_sign(&validator, infraction_height)?;
                metrics::record_slash_packet(infraction, "applied");
            }
            Infraction::Downtime => {
                self.handle_downtime(chain_id, sequence, data, validator)?;
            }
        }
        Ok(Acknowledgement::success())
    }

    fn handle_downtime(
        &mut self,
        chain_id: &ChainId,
        sequence: u64,
        data: SlashPacketData,
        validator: ValidatorInfo,
    ) -> CcvResult<()> {
        let consumer_addr = data.validator.address;
        let queued = self.store.global_queue_len()?;
        let must_queue = queued > 0 || !self.store.throttled_packets(chain_id)?.is_empty();

        if !must_queue {
            let mut meter = self.current_slash_meter()?;
            if meter.allow(validator.slashable_power()) == ThrottleDecision::Apply {
                self.store.set_slash_meter(&meter)?;
                self.jail_for_downtime(&validator.cons_addr)?;
                self.store.append_slash_ack(chain_id, consumer_addr)?;
                metrics::record_slash_packet("downtime", "applied");
                metrics::set_slash_meter_allowance(meter.allowance);
                return Ok(());
            }
        }

        if queued >= self.params.max_throttled_packets {
            metrics::record_slash_packet("downtime", "rejected");
            return Err(CcvError::ThrottleQueueFull {
                size: queued,
                max: self.params.max_throttled_packets,
            });
        }
        self.store.push_global_slash(&GlobalSlashEntry {
            recv_time: self.ctx.time,
            chain_id: chain_id.clone(),
            ibc_sequence: sequence,
            provider_addr: validator.cons_addr,
            consumer_addr,
        })?;
        self.store
            .push_throttled_packet(chain_id, sequence, &ThrottledPacket::Slash(data))?;
        metrics::record_slash_packet("downtime", "queued");
        metrics::set_throttle_queue_size(queued + 1);
        info!(
            "[ccv-provider] throttled downtime slash of {} from {} ({} waiting)",
            validator.cons_addr,
            chain_id,
            queued + 1
        );
        Ok(())
    }

    /// Jail for the downtime jail duration. Already jailed and tombstoned
    /// validators are left alone.
    fn jail_for_downtime(&mut self, provider_addr: &ConsAddress) -> CcvResult<()> {
        let Some(validator) = self.staking.validator_by_cons_addr(provider_addr) else {
            warn!(
                "[ccv-provider] validator {} left the staking module before its slash",
                provider_addr
            );
            return Ok(());
        };
        if validator.jailed || validator.tombstoned {
            return Ok(());
        }
        let until = self
            .ctx
            .time
            .saturating_add(self.params.downtime_jail_duration);
        self.staking.jail(provider_addr, until)?;
        info!(
            "[ccv-provider] jailed {} for downtime until {}",
            provider_addr, until
        );
        Ok(())
    }

    /// Slash, jail forever and tombstone.
    pub(crate) fn slash_double_sign(
        &mut self,
        validator: &ValidatorInfo,
        infraction_height: u64,
    ) -> CcvResult<()> {
        let addr = &validator.cons_addr;
        self.staking.slash(
            addr,
            infraction_height,
            validator.power,
            self.params.slash_fraction_double_sign,
        )?;
        self.staking.jail(addr, Timestamp::MAX)?;
        self.staking.tombstone(addr)?;
        warn!(
            "[ccv-provider] slashed and tombstoned {} for double signing at height {}",
            addr, infraction_height
        );
        Ok(())
    }
}

fn infraction_label(infraction: Infraction) -> &'static str {
    match infraction {
        Infraction::Downtime => "downtime",
        Infraction::DoubleSign => "double_sign",
    }
}
