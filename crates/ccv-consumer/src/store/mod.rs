//! # Consumer Store
//!
//! Typed consumer records over any [`KeyValueStore`]. The consumer holds
//! state for one provider only, so keys carry no chain id.

use crate::domain::{ConsumerParams, CrossChainValidatorSet, InFlightPacket};
use ccv_types::store::{trailing_u64, KeyBuilder, TypedStore};
use ccv_types::{
    CcvError, CcvResult, ChannelId, ChannelRecord, ConsAddress, ConsensusPubKey,
    ConsumerPacketData, KeyValueStore, Timestamp, ValidatorUpdate,
};
use std::collections::BTreeMap;

mod keys {
    pub const PARAMS: u8 = 0x01;
    pub const PROVIDER_CLIENT_ID: u8 = 0x02;
    pub const PRE_CCV: u8 = 0x03;
    pub const INITIAL_VAL_SET: u8 = 0x04;
    pub const STANDALONE_VALIDATORS: u8 = 0x05;
    pub const CHANNEL: u8 = 0x06;
    pub const PROVIDER_CHANNEL: u8 = 0x07;
    pub const HEIGHT_TO_VSC_ID: u8 = 0x08;
    pub const CROSS_CHAIN_VALIDATOR: u8 = 0x09;
    pub const PENDING_CHANGE: u8 = 0x0A;
    pub const MATURING_VSC: u8 = 0x0B;
    pub const OUTSTANDING_DOWNTIME: u8 = 0x0C;
    pub const PENDING_PACKETS: u8 = 0x0D;
    pub const IN_FLIGHT: u8 = 0x0E;
}

fn single(prefix: u8) -> Vec<u8> {
    vec![prefix]
}

fn with_id(prefix: u8, id: u64) -> Vec<u8> {
    KeyBuilder::new(prefix).u64(id).build()
}

fn with_addr(prefix: u8, addr: &ConsAddress) -> Vec<u8> {
    KeyBuilder::new(prefix).bytes(addr.as_bytes()).build()
}

fn addr_suffix(key: &[u8]) -> CcvResult<ConsAddress> {
    let bytes: [u8; 20] = key
        .get(1..)
        .and_then(|rest| rest.try_into().ok())
        .ok_or_else(|| CcvError::CorruptedState("key missing address suffix".to_string()))?;
    Ok(ConsAddress::from_bytes(bytes))
}

/// Typed consumer records.
pub trait ConsumerStore: KeyValueStore {
    fn params(&self) -> CcvResult<ConsumerParams> {
        Ok(self.get_value(&single(keys::PARAMS))?.unwrap_or_default())
    }

    fn set_params(&mut self, params: &ConsumerParams) -> CcvResult<()> {
        self.put_value(&single(keys::PARAMS), params)
    }

    fn provider_client_id(&self) -> CcvResult<Option<String>> {
        self.get_value(&single(keys::PROVIDER_CLIENT_ID))
    }

    fn set_provider_client_id(&mut self, client_id: &str) -> CcvResult<()> {
        self.put_value(&single(keys::PROVIDER_CLIENT_ID), &client_id.to_string())
    }

    fn is_pre_ccv(&self) -> CcvResult<bool> {
        Ok(self.get_value(&single(keys::PRE_CCV))?.unwrap_or(false))
    }

    fn set_pre_ccv(&mut self, pre_ccv: bool) -> CcvResult<()> {
        if pre_ccv {
            self.put_value(&single(keys::PRE_CCV), &true)
        } else {
            self.delete(&single(keys::PRE_CCV))
        }
    }

    fn initial_val_set(&self) -> CcvResult<Vec<ValidatorUpdate>> {
        Ok(self
            .get_value(&single(keys::INITIAL_VAL_SET))?
            .unwrap_or_default())
    }

    fn set_initial_val_set(&mut self, set: &[ValidatorUpdate]) -> CcvResult<()> {
        self.put_value(&single(keys::INITIAL_VAL_SET), &set.to_vec())
    }

    fn standalone_validators(&self) -> CcvResult<Vec<ConsensusPubKey>> {
        Ok(self
            .get_value(&single(keys::STANDALONE_VALIDATORS))?
            .unwrap_or_default())
    }

    fn set_standalone_validators(&mut self, pub_keys: &[ConsensusPubKey]) -> CcvResult<()> {
        if pub_keys.is_empty() {
            self.delete(&single(keys::STANDALONE_VALIDATORS))
        } else {
            self.put_value(&single(keys::STANDALONE_VALIDATORS), &pub_keys.to_vec())
        }
    }

    fn channel(&self) -> CcvResult<ChannelRecord> {
        Ok(self.get_value(&single(keys::CHANNEL))?.unwrap_or_default())
    }

    fn set_channel(&mut self, record: &ChannelRecord) -> CcvResult<()> {
        self.put_value(&single(keys::CHANNEL), record)
    }

    fn provider_channel(&self) -> CcvResult<Option<ChannelId>> {
        self.get_value(&single(keys::PROVIDER_CHANNEL))
    }

    fn set_provider_channel(&mut self, channel_id: &ChannelId) -> CcvResult<()> {
        self.put_value(&single(keys::PROVIDER_CHANNEL), channel_id)
    }

    fn height_vsc_id(&self, height: u64) -> CcvResult<Option<u64>> {
        self.get_value(&with_id(keys::HEIGHT_TO_VSC_ID, height))
    }

    fn set_height_vsc_id(&mut self, height: u64, vsc_id: u64) -> CcvResult<()> {
        self.put_value(&with_id(keys::HEIGHT_TO_VSC_ID, height), &vsc_id)
    }

    /// `(height, vsc_id)` ascending by height.
    fn height_vsc_ids(&self) -> CcvResult<Vec<(u64, u64)>> {
        self.scan_values::<u64>(&single(keys::HEIGHT_TO_VSC_ID))?
            .into_iter()
            .map(|(k, id)| Ok((trailing_u64(&k)?, id)))
            .collect()
    }

    fn delete_height_vsc_id(&mut self, height: u64) -> CcvResult<()> {
        self.delete(&with_id(keys::HEIGHT_TO_VSC_ID, height))
    }

    fn cross_chain_validators(&self) -> CcvResult<CrossChainValidatorSet> {
        self.scan_values::<ValidatorUpdate>(&single(keys::CROSS_CHAIN_VALIDATOR))?
            .into_iter()
            .map(|(k, v)| Ok((addr_suffix(&k)?, v)))
            .collect()
    }

    /// Replace the cross-chain validator set.
    fn set_cross_chain_validators(&mut self, set: &CrossChainValidatorSet) -> CcvResult<()> {
        self.delete_prefix(&single(keys::CROSS_CHAIN_VALIDATOR))?;
        for (addr, validator) in set {
            self.put_value(&with_addr(keys::CROSS_CHAIN_VALIDATOR, addr), validator)?;
        }
        Ok(())
    }

    fn pending_changes(&self) -> CcvResult<BTreeMap<ConsAddress, ValidatorUpdate>> {
        self.scan_values::<ValidatorUpdate>(&single(keys::PENDING_CHANGE))?
            .into_iter()
            .map(|(k, v)| Ok((addr_suffix(&k)?, v)))
            .collect()
    }

    /// Replace the pending changes.
    fn set_pending_changes(&mut self, changes: &BTreeMap<ConsAddress, ValidatorUpdate>) -> CcvResult<()> {
        self.delete_prefix(&single(keys::PENDING_CHANGE))?;
        for (addr, update) in changes {
            self.put_value(&with_addr(keys::PENDING_CHANGE, addr), update)?;
        }
        Ok(())
    }

    fn set_maturity_time(&mut self, vsc_id: u64, maturity_time: Timestamp) -> CcvResult<()> {
        self.put_value(&with_id(keys::MATURING_VSC, vsc_id), &maturity_time)
    }

    /// `(vsc_id, maturity_time)` ascending by id.
    fn maturing_vscs(&self) -> CcvResult<Vec<(u64, Timestamp)>> {
        self.scan_values::<Timestamp>(&single(keys::MATURING_VSC))?
            .into_iter()
            .map(|(k, t)| Ok((trailing_u64(&k)?, t)))
            .collect()
    }

    fn delete_maturity_time(&mut self, vsc_id: u64) -> CcvResult<()> {
        self.delete(&with_id(keys::MATURING_VSC, vsc_id))
    }

    fn has_outstanding_downtime(&self, addr: &ConsAddress) -> CcvResult<bool> {
        self.exists(&with_addr(keys::OUTSTANDING_DOWNTIME, addr))
    }

    fn set_outstanding_downtime(&mut self, addr: &ConsAddress) -> CcvResult<()> {
        self.put(&with_addr(keys::OUTSTANDING_DOWNTIME, addr), &[])
    }

    fn clear_outstanding_downtime(&mut self, addr: &ConsAddress) -> CcvResult<()> {
        self.delete(&with_addr(keys::OUTSTANDING_DOWNTIME, addr))
    }

    fn outstanding_downtime(&self) -> CcvResult<Vec<ConsAddress>> {
        self.prefix_scan(&single(keys::OUTSTANDING_DOWNTIME))?
            .iter()
            .map(|(k, _)| addr_suffix(k))
            .collect()
    }

    /// Packets waiting to be sent, in send order.
    fn pending_packets(&self) -> CcvResult<Vec<ConsumerPacketData>> {
        Ok(self
            .get_value(&single(keys::PENDING_PACKETS))?
            .unwrap_or_default())
    }

    fn set_pending_packets(&mut self, packets: &[ConsumerPacketData]) -> CcvResult<()> {
        if packets.is_empty() {
            self.delete(&single(keys::PENDING_PACKETS))
        } else {
            self.put_value(&single(keys::PENDING_PACKETS), &packets.to_vec())
        }
    }

    fn push_pending_packet(&mut self, packet: ConsumerPacketData) -> CcvResult<()> {
        let mut packets = self.pending_packets()?;
        packets.push(packet);
        self.set_pending_packets(&packets)
    }

    fn in_flight_slash(&self) -> CcvResult<Option<InFlightPacket>> {
        self.get_value(&single(keys::IN_FLIGHT))
    }

    fn set_in_flight_slash(&mut self, in_flight: Option<&InFlightPacket>) -> CcvResult<()> {
        match in_flight {
            Some(packet) => self.put_value(&single(keys::IN_FLIGHT), packet),
            None => self.delete(&single(keys::IN_FLIGHT)),
        }
    }
}

impl<S: KeyValueStore + ?Sized> ConsumerStore for S {}
