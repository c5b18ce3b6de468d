//! # Genesis Import and Export

use super::*;

impl Keeper<'_> {
    pub(crate) fn init_genesis(&mut self, genesis: ProviderGenesis) -> CcvResult<()> {
        let store = &mut *self.store;
        store.set_params(&genesis.params)?;
        store.set_valset_update_id(genesis.valset_update_id)?;
        store.set_client_counter(genesis.client_counter)?;
        if let Some(meter) = &genesis.slash_meter {
            store.set_slash_meter(meter)?;
        }
        for entry in &genesis.valset_update_id_to_height {
            store.set_vsc_id_height(entry.valset_update_id, entry.height)?;
        }
        for op in &genesis.unbonding_ops {
            store.set_unbonding_op(op)?;
        }
        for entry in &genesis.throttle_queue {
            store.push_global_slash(entry)?;
        }

        for state in &genesis.consumer_states {
            let chain_id = &state.chain.chain_id;
            store.set_consumer_chain(&state.chain)?;
            if let Some(channel_id) = &state.chain.channel.channel_id {
                store.set_channel_chain(channel_id, chain_id)?;
            }
            if let Some(consumer_genesis) = &state.consumer_genesis {
                store.set_consumer_genesis(chain_id, consumer_genesis)?;
            }
            for packet in &state.pending_vsc_packets {
                store.append_pending_vsc_packet(chain_id, packet)?;
            }
            for assigned in &state.assigned_keys {
                store.set_assigned_key(chain_id, &assigned.provider_addr, &assigned.consumer_key)?;
            }
            for entry in &state.key_records {
                store.set_key_record(chain_id, &entry.consumer_addr, &entry.record)?;
            }
            let last_sent: ConsumerValidatorSet = state
                .last_sent
                .iter()
                .map(|e| (e.provider_addr, e.validator.clone()))
                .collect();
            store.set_last_sent(chain_id, &last_sent)?;
            store.set_slash_acks(chain_id, &state.pending_slash_acks)?;
            for entry in &state.unbonding_index {
                store.set_unbonding_index(chain_id, entry.valset_update_id, &entry.op_ids)?;
            }
            for entry in &state.vsc_send_times {
                store.set_vsc_send_time(chain_id, entry.valset_update_id, entry.time)?;
            }
            if state.latest_matured_vsc_id > 0 {
                store.set_latest_matured_vsc_id(chain_id, state.latest_matured_vsc_id)?;
            }
            for entry in &state.throttled_packets {
                store.push_throttled_packet(chain_id, entry.ibc_sequence, &entry.packet)?;
            }
        }
        self.params = genesis.params;
        info!(
            "[ccv-provider] initialized genesis with {} consumer chains at VSC {}",
            genesis.consumer_states.len(),
            genesis.valset_update_id
        );
        Ok(())
    }
}

/// Snapshot every provider table.
pub(crate) fn export_genesis<S: KeyValueStore + ?Sized>(store: &S) -> CcvResult<ProviderGenesis> {
    let mut consumer_states = Vec::new();
    for chain in store.consumer_chains()? {
        let chain_id = &chain.chain_id;
        consumer_states.push(ConsumerState {
            consumer_genesis: store.consumer_genesis(chain_id)?,
            pending_vsc_packets: store.pending_vsc_packets(chain_id)?,
            assigned_keys: store
                .assigned_keys(chain_id)?
                .into_iter()
                .map(|(provider_addr, consumer_key)| AssignedKey {
                    provider_addr,
                    consumer_key,
                })
                .collect(),
            key_records: store
                .key_records(chain_id)?
                .into_iter()
                .map(|(consumer_addr, record)| KeyRecord {
                    consumer_addr,
                    record,
                })
                .collect(),
            last_sent: store
                .last_sent(chain_id)?
                .into_iter()
                .map(|(provider_addr, validator)| LastSentEntry {
                    provider_addr,
                    validator,
                })
                .collect(),
            pending_slash_acks: store.slash_acks(chain_id)?,
            unbonding_index: store
                .unbonding_index(chain_id)?
                .into_iter()
                .map(|(valset_update_id, op_ids)| UnbondingIndexEntry {
                    valset_update_id,
                    op_ids,
                })
                .collect(),
            vsc_send_times: store
                .vsc_send_times(chain_id)?
                .into_iter()
                .map(|(valset_update_id, time)| VscSendTime {
                    valset_update_id,
                    time,
                })
                .collect(),
            latest_matured_vsc_id: store.latest_matured_vsc_id(chain_id)?,
            throttled_packets: store
                .throttled_packets(chain_id)?
                .into_iter()
                .map(|(ibc_sequence, packet)| ThrottledEntry {
                    ibc_sequence,
                    packet,
                })
                .collect(),
            chain,
        });
    }

    Ok(ProviderGenesis {
        valset_update_id: store.valset_update_id()?,
        params: store.params()?,
        client_counter: store.client_counter()?,
        consumer_states,
        valset_update_id_to_height: store
            .vsc_id_heights()?
            .into_iter()
            .map(|(valset_update_id, height)| VscIdToHeight {
                valset_update_id,
                height,
            })
            .collect(),
        unbonding_ops: store.unbonding_ops()?,
        slash_meter: store.slash_meter()?,
        throttle_queue: store
            .global_slash_queue()?
            .into_iter()
            .map(|(_, entry)| entry)
            .collect(),
    })
}
