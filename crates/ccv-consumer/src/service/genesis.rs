//! # Genesis Import/Export

use super::*;

impl Keeper<'_> {
    /// Write `genesis` into the store and return the set consensus starts
    /// with. A pre-CCV chain keeps its standalone set until changeover.
    pub(crate) fn init_genesis(&mut self, genesis: ConsumerGenesis) -> CcvResult<Vec<ValidatorUpdate>> {
        self.store.set_params(&genesis.params)?;
        self.params = genesis.params.clone();
        self.store.set_provider_client_id(&genesis.provider_client_id)?;
        self.store.set_initial_val_set(&genesis.initial_val_set)?;
        self.store.set_standalone_validators(&genesis.standalone_validators)?;
        self.store.set_pre_ccv(genesis.pre_ccv)?;

        if genesis.new_chain {
            self.store.set_height_vsc_id(self.ctx.height, 0)?;
            if genesis.pre_ccv {
                info!(
                    "[ccv-consumer] {} starts pre-CCV, changeover at the first end block",
                    self.chain_id
                );
                return Ok(Vec::new());
            }
            let mut set = CrossChainValidatorSet::new();
            apply_changes(&mut set, &genesis.initial_val_set);
            self.store.set_cross_chain_validators(&set)?;
            metrics::set_validator_count(set.len());
            info!(
                "[ccv-consumer] {} starts with {} provider validators",
                self.chain_id,
                set.len()
            );
            return Ok(set.into_values().collect());
        }

        self.store.set_channel(&genesis.channel)?;
        if let Some(channel_id) = &genesis.provider_channel_id {
            self.store.set_provider_channel(channel_id)?;
        }
        let set: CrossChainValidatorSet = genesis
            .cross_chain_validators
            .iter()
            .map(|v| (v.address(), v.clone()))
            .collect();
        self.store.set_cross_chain_validators(&set)?;
        for entry in &genesis.height_to_valset_update_id {
            self.store
                .set_height_vsc_id(entry.height, entry.valset_update_id)?;
        }
        for addr in &genesis.outstanding_downtime {
            self.store.set_outstanding_downtime(addr)?;
        }
        self.store
            .set_pending_packets(&genesis.pending_consumer_packets)?;
        self.store
            .set_in_flight_slash(genesis.in_flight_slash.as_ref())?;
        for packet in &genesis.maturing_packets {
            self.store
                .set_maturity_time(packet.valset_update_id, packet.maturity_time)?;
        }
        let mut pending = BTreeMap::new();
        merge_changes(&mut pending, &genesis.pending_changes);
        self.store.set_pending_changes(&pending)?;

        info!(
            "[ccv-consumer] {} restarted with {} validators, channel {:?}",
            self.chain_id,
            set.len(),
            genesis.channel.state
        );
        if genesis.pre_ccv {
            return Ok(Vec::new());
        }
        metrics::set_validator_count(set.len());
        Ok(set.into_values().collect())
    }
}

/// Snapshot the consumer state as a restart genesis.
pub(crate) fn export_genesis<S: KeyValueStore + ?Sized>(store: &S) -> CcvResult<ConsumerGenesis> {
    let provider_client_id = store
        .provider_client_id()?
        .ok_or_else(|| CcvError::CorruptedState("consumer genesis was never loaded".to_string()))?;
    Ok(ConsumerGenesis {
        params: store.params()?,
        new_chain: false,
        provider_client_id,
        initial_val_set: store.initial_val_set()?,
        pre_ccv: store.is_pre_ccv()?,
        standalone_validators: store.standalone_validators()?,
        channel: store.channel()?,
        provider_channel_id: store.provider_channel()?,
        cross_chain_validators: store.cross_chain_validators()?.into_values().collect(),
        height_to_valset_update_id: store
            .height_vsc_ids()?
            .into_iter()
            .map(|(height, valset_update_id)| HeightToVscId {
                height,
                valset_update_id,
            })
            .collect(),
        outstanding_downtime: store.outstanding_downtime()?,
        pending_consumer_packets: store.pending_packets()?,
        in_flight_slash: store.in_flight_slash()?,
        maturing_packets: store
            .maturing_vscs()?
            .into_iter()
            .map(|(valset_update_id, maturity_time)| MaturingVscPacket {
                valset_update_id,
                maturity_time,
            })
            .collect(),
        pending_changes: store.pending_changes()?.into_values().collect(),
    })
}
