//! # Consumer Genesis
//!
//! Produced by the provider when a consumer launches (`new_chain = true`),
//! and exported by a running consumer for restarts. Fields after `pre_ccv`
//! only carry restart state and default to empty in JSON.

use super::params::ConsumerParams;
use ccv_types::{
    validate_identifier, CcvError, CcvResult, ChannelId, ChannelRecord, ChannelState, ConsAddress,
    ConsensusPubKey, ConsumerPacketData, Timestamp, ValidatorUpdate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `height → valset_update_id` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightToVscId {
    pub height: u64,
    pub valset_update_id: u64,
}

/// Received VSC waiting for its unbonding period to elapse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaturingVscPacket {
    pub valset_update_id: u64,
    pub maturity_time: Timestamp,
}

/// Packet sent to the provider and not yet acknowledged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlightPacket {
    /// Transport sequence.
    pub sequence: u64,
    pub data: ConsumerPacketData,
}

/// Consumer genesis state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerGenesis {
    pub params: ConsumerParams,
    /// True when produced by the provider at launch.
    pub new_chain: bool,
    /// Client of the provider chain on this consumer.
    pub provider_client_id: String,
    /// Validator set chosen by the provider at launch.
    pub initial_val_set: Vec<ValidatorUpdate>,
    /// The consumer was a standalone chain and changes over at its first end block.
    pub pre_ccv: bool,
    /// Standalone validators replaced at changeover.
    #[serde(default)]
    pub standalone_validators: Vec<ConsensusPubKey>,
    #[serde(default)]
    pub channel: ChannelRecord,
    /// Channel the first VSC packet arrived on.
    #[serde(default)]
    pub provider_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub cross_chain_validators: Vec<ValidatorUpdate>,
    #[serde(default)]
    pub height_to_valset_update_id: Vec<HeightToVscId>,
    #[serde(default)]
    pub outstanding_downtime: Vec<ConsAddress>,
    #[serde(default)]
    pub pending_consumer_packets: Vec<ConsumerPacketData>,
    #[serde(default)]
    pub in_flight_slash: Option<InFlightPacket>,
    #[serde(default)]
    pub maturing_packets: Vec<MaturingVscPacket>,
    #[serde(default)]
    pub pending_changes: Vec<ValidatorUpdate>,
}

impl ConsumerGenesis {
    /// Genesis handed to a freshly launched consumer.
    pub fn new_chain(
        params: ConsumerParams,
        provider_client_id: impl Into<String>,
        initial_val_set: Vec<ValidatorUpdate>,
        pre_ccv: bool,
    ) -> Self {
        Self {
            params,
            new_chain: true,
            provider_client_id: provider_client_id.into(),
            initial_val_set,
            pre_ccv,
            standalone_validators: Vec::new(),
            channel: ChannelRecord::default(),
            provider_channel_id: None,
            cross_chain_validators: Vec::new(),
            height_to_valset_update_id: Vec::new(),
            outstanding_downtime: Vec::new(),
            pending_consumer_packets: Vec::new(),
            in_flight_slash: None,
            maturing_packets: Vec::new(),
            pending_changes: Vec::new(),
        }
    }

    pub fn validate(&self) -> CcvResult<()> {
        let invalid = |reason: String| CcvError::InvalidGenesis(reason);

        self.params
            .validate()
            .map_err(|e| invalid(e.to_string()))?;
        validate_identifier(&self.provider_client_id, 9, 64).map_err(|e| {
            invalid(format!(
                "provider client id {:?}: {e}",
                self.provider_client_id
            ))
        })?;

        if self.initial_val_set.is_empty() {
            return Err(invalid("initial validator set is empty".to_string()));
        }
        let mut seen = BTreeSet::new();
        for update in &self.initial_val_set {
            if update.power <= 0 {
                return Err(invalid(format!(
                    "initial validator {} has power {}",
                    update.address(),
                    update.power
                )));
            }
            if !seen.insert(update.address()) {
                return Err(invalid(format!(
                    "duplicate initial validator {}",
                    update.address()
                )));
            }
        }

        if self.new_chain {
            let restart_state = self.channel.state != ChannelState::Uninitialized
                || self.provider_channel_id.is_some()
                || !self.height_to_valset_update_id.is_empty()
                || !self.pending_consumer_packets.is_empty()
                || self.in_flight_slash.is_some()
                || !self.maturing_packets.is_empty();
            if restart_state {
                return Err(invalid("new chain genesis carries restart state".to_string()));
            }
            return Ok(());
        }

        let needs_channel = matches!(
            self.channel.state,
            ChannelState::HandshakeInProgress | ChannelState::Established
        );
        if needs_channel && self.channel.channel_id.is_none() {
            return Err(invalid("channel state without channel id".to_string()));
        }
        for packet in &self.pending_consumer_packets {
            packet
                .validate()
                .map_err(|e| invalid(format!("pending consumer packet: {e}")))?;
        }
        if let Some(in_flight) = &self.in_flight_slash {
            in_flight
                .data
                .validate()
                .map_err(|e| invalid(format!("in-flight packet: {e}")))?;
        }
        if let Some(entry) = self
            .maturing_packets
            .iter()
            .find(|p| p.valset_update_id == 0)
        {
            return Err(invalid(format!(
                "maturing packet with zero id (maturity {})",
                entry.maturity_time
            )));
        }
        Ok(())
    }
}
