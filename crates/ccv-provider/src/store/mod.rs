//! # Provider Store
//!
//! Typed provider records over any [`KeyValueStore`]. Every accessor is
//! available on a block write-set (`CachedKvStore`) as well as on the
//! backing store.

pub mod keys;

use crate::domain::{
    ConsumerAddrRecord, ConsumerChain, ConsumerValidator, ConsumerValidatorSet,
    GlobalSlashEntry, ProviderParams, SlashMeter, ThrottledPacket, UnbondingOp,
};
use ccv_consumer::ConsumerGenesis;
use ccv_types::store::{trailing_u64, TypedStore};
use ccv_types::{
    CcvError, CcvResult, ChainId, ChannelId, ConsAddress, ConsensusPubKey, KeyValueStore,
    Timestamp, VscPacketData,
};

fn addr_of(key: &[u8]) -> CcvResult<ConsAddress> {
    keys::trailing_addr(key)
        .ok_or_else(|| CcvError::CorruptedState("key missing address suffix".to_string()))
}

/// Typed provider records.
pub trait ProviderStore: KeyValueStore {
    // ------------------------------------------------------------------ globals

    fn params(&self) -> CcvResult<ProviderParams> {
        Ok(self
            .get_value(&keys::global(keys::PARAMS))?
            .unwrap_or_default())
    }

    fn set_params(&mut self, params: &ProviderParams) -> CcvResult<()> {
        self.put_value(&keys::global(keys::PARAMS), params)
    }

    /// Id of the next VSC packet; starts at 1.
    fn valset_update_id(&self) -> CcvResult<u64> {
        Ok(self
            .get_value(&keys::global(keys::VALSET_UPDATE_ID))?
            .unwrap_or(1))
    }

    fn set_valset_update_id(&mut self, id: u64) -> CcvResult<()> {
        self.put_value(&keys::global(keys::VALSET_UPDATE_ID), &id)
    }

    fn client_counter(&self) -> CcvResult<u64> {
        Ok(self
            .get_value(&keys::global(keys::CLIENT_COUNTER))?
            .unwrap_or(0))
    }

    fn set_client_counter(&mut self, counter: u64) -> CcvResult<()> {
        self.put_value(&keys::global(keys::CLIENT_COUNTER), &counter)
    }

    fn slash_meter(&self) -> CcvResult<Option<SlashMeter>> {
        self.get_value(&keys::global(keys::SLASH_METER))
    }

    fn set_slash_meter(&mut self, meter: &SlashMeter) -> CcvResult<()> {
        self.put_value(&keys::global(keys::SLASH_METER), meter)
    }

    fn vsc_id_height(&self, vsc_id: u64) -> CcvResult<Option<u64>> {
        self.get_value(&keys::global_id(keys::VSC_ID_TO_HEIGHT, vsc_id))
    }

    fn set_vsc_id_height(&mut self, vsc_id: u64, height: u64) -> CcvResult<()> {
        self.put_value(&keys::global_id(keys::VSC_ID_TO_HEIGHT, vsc_id), &height)
    }

    /// `(vsc_id, height)` ascending by id.
    fn vsc_id_heights(&self) -> CcvResult<Vec<(u64, u64)>> {
        self.scan_values::<u64>(&keys::global(keys::VSC_ID_TO_HEIGHT))?
            .into_iter()
            .map(|(k, height)| Ok((trailing_u64(&k)?, height)))
            .collect()
    }

    /// Remove mappings with id `< vsc_id`.
    fn prune_vsc_id_heights_below(&mut self, vsc_id: u64) -> CcvResult<()> {
        for (id, _) in self.vsc_id_heights()? {
            if id >= vsc_id {
                break;
            }
            self.delete(&keys::global_id(keys::VSC_ID_TO_HEIGHT, id))?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------ throttle

    /// Append to the global throttle queue, returning the entry's position key.
    fn push_global_slash(&mut self, entry: &GlobalSlashEntry) -> CcvResult<u64> {
        let next: u64 = self
            .get_value(&keys::global(keys::THROTTLE_NEXT))?
            .unwrap_or(0);
        self.put_value(&keys::global_id(keys::THROTTLE_GLOBAL, next), entry)?;
        self.put_value(&keys::global(keys::THROTTLE_NEXT), &(next + 1))?;
        Ok(next)
    }

    /// Global throttle queue in arrival order.
    fn global_slash_queue(&self) -> CcvResult<Vec<(u64, GlobalSlashEntry)>> {
        self.scan_values::<GlobalSlashEntry>(&keys::global(keys::THROTTLE_GLOBAL))?
            .into_iter()
            .map(|(k, entry)| Ok((trailing_u64(&k)?, entry)))
            .collect()
    }

    fn global_queue_len(&self) -> CcvResult<u64> {
        Ok(self
            .prefix_scan(&keys::global(keys::THROTTLE_GLOBAL))?
            .len() as u64)
    }

    fn delete_global_slash(&mut self, position: u64) -> CcvResult<()> {
        self.delete(&keys::global_id(keys::THROTTLE_GLOBAL, position))
    }

    fn push_throttled_packet(
        &mut self,
        chain_id: &ChainId,
        ibc_sequence: u64,
        packet: &ThrottledPacket,
    ) -> CcvResult<()> {
        self.put_value(
            &keys::chain_id(keys::THROTTLED_PACKET, chain_id, ibc_sequence),
            packet,
        )
    }

    /// Per-chain throttle queue ascending by transport sequence.
    fn throttled_packets(&self, chain_id: &ChainId) -> CcvResult<Vec<(u64, ThrottledPacket)>> {
        self.scan_values::<ThrottledPacket>(&keys::chain(keys::THROTTLED_PACKET, chain_id))?
            .into_iter()
            .map(|(k, packet)| Ok((trailing_u64(&k)?, packet)))
            .collect()
    }

    fn delete_throttled_packet(&mut self, chain_id: &ChainId, ibc_sequence: u64) -> CcvResult<()> {
        self.delete(&keys::chain_id(
            keys::THROTTLED_PACKET,
            chain_id,
            ibc_sequence,
        ))
    }

    // ------------------------------------------------------------------ unbonding

    fn unbonding_op(&self, op_id: u64) -> CcvResult<Option<UnbondingOp>> {
        self.get_value(&keys::global_id(keys::UNBONDING_OP, op_id))
    }

    fn set_unbonding_op(&mut self, op: &UnbondingOp) -> CcvResult<()> {
        self.put_value(&keys::global_id(keys::UNBONDING_OP, op.id), op)
    }

    fn delete_unbonding_op(&mut self, op_id: u64) -> CcvResult<()> {
        self.delete(&keys::global_id(keys::UNBONDING_OP, op_id))
    }

    fn unbonding_ops(&self) -> CcvResult<Vec<UnbondingOp>> {
        Ok(self
            .scan_values::<UnbondingOp>(&keys::global(keys::UNBONDING_OP))?
            .into_iter()
            .map(|(_, op)| op)
            .collect())
    }

    fn unbonding_index_at(&self, chain_id: &ChainId, vsc_id: u64) -> CcvResult<Vec<u64>> {
        Ok(self
            .get_value(&keys::chain_id(keys::UNBONDING_INDEX, chain_id, vsc_id))?
            .unwrap_or_default())
    }

    fn set_unbonding_index(&mut self, chain_id: &ChainId, vsc_id: u64, ops: &[u64]) -> CcvResult<()> {
        let key = keys::chain_id(keys::UNBONDING_INDEX, chain_id, vsc_id);
        if ops.is_empty() {
            self.delete(&key)
        } else {
            self.put_value(&key, &ops.to_vec())
        }
    }

    /// `(vsc_id, op_ids)` ascending by id.
    fn unbonding_index(&self, chain_id: &ChainId) -> CcvResult<Vec<(u64, Vec<u64>)>> {
        self.scan_values::<Vec<u64>>(&keys::chain(keys::UNBONDING_INDEX, chain_id))?
            .into_iter()
            .map(|(k, ops)| Ok((trailing_u64(&k)?, ops)))
            .collect()
    }

    // ------------------------------------------------------------------ chains

    fn consumer_chain(&self, chain_id: &ChainId) -> CcvResult<Option<ConsumerChain>> {
        self.get_value(&keys::chain(keys::CONSUMER_CHAIN, chain_id))
    }

    /// The chain record, or `UnknownChain`.
    fn require_chain(&self, chain_id: &ChainId) -> CcvResult<ConsumerChain> {
        self.consumer_chain(chain_id)?
            .ok_or_else(|| CcvError::UnknownChain(chain_id.clone()))
    }

    fn set_consumer_chain(&mut self, chain: &ConsumerChain) -> CcvResult<()> {
        self.put_value(&keys::chain(keys::CONSUMER_CHAIN, &chain.chain_id), chain)
    }

    /// Every registered chain, closed ones included, in key order.
    fn consumer_chains(&self) -> CcvResult<Vec<ConsumerChain>> {
        Ok(self
            .scan_values::<ConsumerChain>(&keys::global(keys::CONSUMER_CHAIN))?
            .into_iter()
            .map(|(_, chain)| chain)
            .collect())
    }

    fn consumer_genesis(&self, chain_id: &ChainId) -> CcvResult<Option<ConsumerGenesis>> {
        self.get_value(&keys::chain(keys::CONSUMER_GENESIS, chain_id))
    }

    fn set_consumer_genesis(&mut self, chain_id: &ChainId, genesis: &ConsumerGenesis) -> CcvResult<()> {
        self.put_value(&keys::chain(keys::CONSUMER_GENESIS, chain_id), genesis)
    }

    fn chain_for_channel(&self, channel_id: &ChannelId) -> CcvResult<Option<ChainId>> {
        self.get_value(&keys::channel(channel_id))
    }

    fn set_channel_chain(&mut self, channel_id: &ChannelId, chain_id: &ChainId) -> CcvResult<()> {
        self.put_value(&keys::channel(channel_id), chain_id)
    }

    fn delete_channel_chain(&mut self, channel_id: &ChannelId) -> CcvResult<()> {
        self.delete(&keys::channel(channel_id))
    }

    // ------------------------------------------------------------------ packets

    /// Pending VSC packets ascending by id.
    fn pending_vsc_packets(&self, chain_id: &ChainId) -> CcvResult<Vec<VscPacketData>> {
        Ok(self
            .scan_values::<VscPacketData>(&keys::chain(keys::PENDING_VSC, chain_id))?
            .into_iter()
            .map(|(_, p)| p)
            .collect())
    }

    /// Append a pending VSC packet; ids must strictly increase.
    fn append_pending_vsc_packet(&mut self, chain_id: &ChainId, packet: &VscPacketData) -> CcvResult<()> {
        let last = self
            .prefix_scan(&keys::chain(keys::PENDING_VSC, chain_id))?
            .last()
            .map(|(k, _)| trailing_u64(k))
            .transpose()?;
        if let Some(last) = last {
            if packet.valset_update_id <= last {
                return Err(CcvError::DuplicateVscId {
                    chain_id: chain_id.clone(),
                    vsc_id: packet.valset_update_id,
                    last,
                });
            }
        }
        self.put_value(
            &keys::chain_id(keys::PENDING_VSC, chain_id, packet.valset_update_id),
            packet,
        )
    }

    fn delete_pending_vsc_packet(&mut self, chain_id: &ChainId, vsc_id: u64) -> CcvResult<()> {
        self.delete(&keys::chain_id(keys::PENDING_VSC, chain_id, vsc_id))
    }

    fn slash_acks(&self, chain_id: &ChainId) -> CcvResult<Vec<ConsAddress>> {
        Ok(self
            .get_value(&keys::chain(keys::SLASH_ACKS, chain_id))?
            .unwrap_or_default())
    }

    fn set_slash_acks(&mut self, chain_id: &ChainId, acks: &[ConsAddress]) -> CcvResult<()> {
        let key = keys::chain(keys::SLASH_ACKS, chain_id);
        if acks.is_empty() {
            self.delete(&key)
        } else {
            self.put_value(&key, &acks.to_vec())
        }
    }

    fn append_slash_ack(&mut self, chain_id: &ChainId, addr: ConsAddress) -> CcvResult<()> {
        let mut acks = self.slash_acks(chain_id)?;
        acks.push(addr);
        self.set_slash_acks(chain_id, &acks)
    }

    fn set_vsc_send_time(&mut self, chain_id: &ChainId, vsc_id: u64, time: Timestamp) -> CcvResult<()> {
        self.put_value(&keys::chain_id(keys::VSC_SEND_TIME, chain_id, vsc_id), &time)
    }

    /// `(vsc_id, send_time)` ascending by id.
    fn vsc_send_times(&self, chain_id: &ChainId) -> CcvResult<Vec<(u64, Timestamp)>> {
        self.scan_values::<Timestamp>(&keys::chain(keys::VSC_SEND_TIME, chain_id))?
            .into_iter()
            .map(|(k, t)| Ok((trailing_u64(&k)?, t)))
            .collect()
    }

    fn delete_vsc_send_time(&mut self, chain_id: &ChainId, vsc_id: u64) -> CcvResult<()> {
        self.delete(&keys::chain_id(keys::VSC_SEND_TIME, chain_id, vsc_id))
    }

    fn latest_matured_vsc_id(&self, chain_id: &ChainId) -> CcvResult<u64> {
        Ok(self
            .get_value(&keys::chain(keys::LATEST_MATURED, chain_id))?
            .unwrap_or(0))
    }

    fn set_latest_matured_vsc_id(&mut self, chain_id: &ChainId, vsc_id: u64) -> CcvResult<()> {
        self.put_value(&keys::chain(keys::LATEST_MATURED, chain_id), &vsc_id)
    }

    // ------------------------------------------------------------------ keys

    fn assigned_key(&self, chain_id: &ChainId, provider_addr: &ConsAddress) -> CcvResult<Option<ConsensusPubKey>> {
        self.get_value(&keys::chain_addr(keys::ASSIGNED_KEY, chain_id, provider_addr))
    }

    fn set_assigned_key(
        &mut self,
        chain_id: &ChainId,
        provider_addr: &ConsAddress,
        key: &ConsensusPubKey,
    ) -> CcvResult<()> {
        self.put_value(&keys::chain_addr(keys::ASSIGNED_KEY, chain_id, provider_addr), key)
    }

    /// `(provider_addr, consumer_key)` ascending by provider address.
    fn assigned_keys(&self, chain_id: &ChainId) -> CcvResult<Vec<(ConsAddress, ConsensusPubKey)>> {
        self.scan_values::<ConsensusPubKey>(&keys::chain(keys::ASSIGNED_KEY, chain_id))?
            .into_iter()
            .map(|(k, key)| Ok((addr_of(&k)?, key)))
            .collect()
    }

    fn key_record(&self, chain_id: &ChainId, consumer_addr: &ConsAddress) -> CcvResult<Option<ConsumerAddrRecord>> {
        self.get_value(&keys::chain_addr(keys::KEY_RECORD, chain_id, consumer_addr))
    }

    fn set_key_record(
        &mut self,
        chain_id: &ChainId,
        consumer_addr: &ConsAddress,
        record: &ConsumerAddrRecord,
    ) -> CcvResult<()> {
        self.put_value(&keys::chain_addr(keys::KEY_RECORD, chain_id, consumer_addr), record)
    }

    /// `(consumer_addr, record)` ascending by consumer address.
    fn key_records(&self, chain_id: &ChainId) -> CcvResult<Vec<(ConsAddress, ConsumerAddrRecord)>> {
        self.scan_values::<ConsumerAddrRecord>(&keys::chain(keys::KEY_RECORD, chain_id))?
            .into_iter()
            .map(|(k, record)| Ok((addr_of(&k)?, record)))
            .collect()
    }

    fn last_sent(&self, chain_id: &ChainId) -> CcvResult<ConsumerValidatorSet> {
        self.scan_values::<ConsumerValidator>(&keys::chain(keys::LAST_SENT, chain_id))?
            .into_iter()
            .map(|(k, v)| Ok((addr_of(&k)?, v)))
            .collect()
    }

    /// Replace the last-sent set.
    fn set_last_sent(&mut self, chain_id: &ChainId, set: &ConsumerValidatorSet) -> CcvResult<()> {
        self.delete_prefix(&keys::chain(keys::LAST_SENT, chain_id))?;
        for (provider_addr, validator) in set {
            self.put_value(
                &keys::chain_addr(keys::LAST_SENT, chain_id, provider_addr),
                validator,
            )?;
        }
        Ok(())
    }

    /// Drop the packet and queue tables of a stopped chain. Key records stay.
    fn delete_chain_queues(&mut self, chain_id: &ChainId) -> CcvResult<()> {
        for prefix in [
            keys::PENDING_VSC,
            keys::LAST_SENT,
            keys::SLASH_ACKS,
            keys::UNBONDING_INDEX,
            keys::VSC_SEND_TIME,
            keys::THROTTLED_PACKET,
        ] {
            self.delete_prefix(&keys::chain(prefix, chain_id))?;
        }
        for (position, entry) in self.global_slash_queue()? {
            if &entry.chain_id == chain_id {
                self.delete_global_slash(position)?;
            }
        }
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> ProviderStore for S {}
