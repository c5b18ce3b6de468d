//! # Provider Genesis
//!
//! Snapshot of every provider table. `export_genesis` followed by
//! `init_genesis` on an empty store reproduces the same state.

use super::chain::ConsumerChain;
use super::key_assignment::ConsumerAddrRecord;
use super::params::ProviderParams;
use super::throttle::{GlobalSlashEntry, SlashMeter, ThrottledPacket};
use super::unbonding::UnbondingOp;
use super::validator_set::ConsumerValidator;
use ccv_consumer::ConsumerGenesis;
use ccv_types::{
    validate_identifier, CcvError, CcvResult, ChannelState, ConsAddress, ConsensusPubKey,
    Timestamp, VscPacketData,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `valset_update_id → provider height`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VscIdToHeight {
    pub valset_update_id: u64,
    pub height: u64,
}

/// Explicit key assignment of a provider validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedKey {
    pub provider_addr: ConsAddress,
    pub consumer_key: ConsensusPubKey,
}

/// Reverse key record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub consumer_addr: ConsAddress,
    pub record: ConsumerAddrRecord,
}

/// Validator last sent to a consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSentEntry {
    pub provider_addr: ConsAddress,
    pub validator: ConsumerValidator,
}

/// Unbonding ops waiting on one VSC id of one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingIndexEntry {
    pub valset_update_id: u64,
    pub op_ids: Vec<u64>,
}

/// Block time a VSC packet was sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VscSendTime {
    pub valset_update_id: u64,
    pub time: Timestamp,
}

/// Packet in a per-chain throttle queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottledEntry {
    pub ibc_sequence: u64,
    pub packet: ThrottledPacket,
}

/// Everything the provider keeps for one consumer chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerState {
    pub chain: ConsumerChain,
    /// Genesis handed to the consumer at launch.
    pub consumer_genesis: Option<ConsumerGenesis>,
    pub pending_vsc_packets: Vec<VscPacketData>,
    pub assigned_keys: Vec<AssignedKey>,
    pub key_records: Vec<KeyRecord>,
    pub last_sent: Vec<LastSentEntry>,
    pub pending_slash_acks: Vec<ConsAddress>,
    pub unbonding_index: Vec<UnbondingIndexEntry>,
    pub vsc_send_times: Vec<VscSendTime>,
    pub latest_matured_vsc_id: u64,
    pub throttled_packets: Vec<ThrottledEntry>,
}

impl ConsumerState {
    fn validate(&self) -> CcvResult<()> {
        let chain_id = &self.chain.chain_id;
        let invalid = |reason: String| CcvError::InvalidGenesis(format!("{chain_id}: {reason}"));

        if let Some(launch) = &self.chain.launch {
            validate_identifier(&launch.client_id, 9, 64)
                .map_err(|e| invalid(format!("client id {:?}: {e}", launch.client_id)))?;
        }
        let needs_channel = matches!(
            self.chain.channel.state,
            ChannelState::HandshakeInProgress | ChannelState::Established
        );
        if needs_channel && self.chain.channel.channel_id.is_none() {
            return Err(invalid("channel state without channel id".to_string()));
        }
        let opened = !matches!(
            self.chain.channel.state,
            ChannelState::Uninitialized | ChannelState::Closed
        );
        if opened && !self.chain.is_launched() {
            return Err(invalid("channel opened before launch".to_string()));
        }

        let mut last = 0u64;
        for packet in &self.pending_vsc_packets {
            if packet.valset_update_id == 0 {
                return Err(invalid("pending VSC packet with zero id".to_string()));
            }
            if packet.valset_update_id <= last {
                return Err(invalid(format!(
                    "pending VSC packet ids not increasing: {} after {last}",
                    packet.valset_update_id
                )));
            }
            last = packet.valset_update_id;
        }

        for record in &self.key_records {
            if record.record.consumer_key.address() != record.consumer_addr {
                return Err(invalid(format!(
                    "key record {} does not match its key",
                    record.consumer_addr
                )));
            }
        }

        if let Some(genesis) = &self.consumer_genesis {
            genesis
                .validate()
                .map_err(|e| invalid(format!("consumer genesis: {e}")))?;
        }
        Ok(())
    }
}

/// Provider genesis state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderGenesis {
    /// Next VSC id to send.
    pub valset_update_id: u64,
    pub params: ProviderParams,
    /// Number of consumer clients created so far.
    pub client_counter: u64,
    pub consumer_states: Vec<ConsumerState>,
    pub valset_update_id_to_height: Vec<VscIdToHeight>,
    pub unbonding_ops: Vec<UnbondingOp>,
    pub slash_meter: Option<SlashMeter>,
    /// Global throttle queue in arrival order.
    pub throttle_queue: Vec<GlobalSlashEntry>,
}

impl Default for ProviderGenesis {
    fn default() -> Self {
        Self {
            valset_update_id: 1,
            params: ProviderParams::default(),
            client_counter: 0,
            consumer_states: Vec::new(),
            valset_update_id_to_height: Vec::new(),
            unbonding_ops: Vec::new(),
            slash_meter: None,
            throttle_queue: Vec::new(),
        }
    }
}

impl ProviderGenesis {
    /// Validate the snapshot.
    pub fn validate(&self) -> CcvResult<()> {
        if self.valset_update_id == 0 {
            return Err(CcvError::InvalidGenesis(
                "valset update id cannot be zero".to_string(),
            ));
        }
        self.params
            .validate()
            .map_err(|e| CcvError::InvalidGenesis(e.to_string()))?;

        if self
            .valset_update_id_to_height
            .iter()
            .any(|entry| entry.valset_update_id == 0)
        {
            return Err(CcvError::InvalidGenesis(
                "valset update id to height mapping with zero id".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for state in &self.consumer_states {
            if !seen.insert(&state.chain.chain_id) {
                return Err(CcvError::InvalidGenesis(format!(
                    "duplicate consumer chain {}",
                    state.chain.chain_id
                )));
            }
            state.validate()?;
        }

        for op in &self.unbonding_ops {
            if op.owed.is_empty() {
                return Err(CcvError::InvalidGenesis(format!(
                    "unbonding op {} owes no consumer",
                    op.id
                )));
            }
            if let Some(chain_id) = op.owed.iter().find(|c| !seen.contains(c)) {
                return Err(CcvError::InvalidGenesis(format!(
                    "unbonding op {} owed by unknown chain {chain_id}",
                    op.id
                )));
            }
        }

        if let Some(entry) = self
            .throttle_queue
            .iter()
            .find(|e| !seen.contains(&e.chain_id))
        {
            return Err(CcvError::InvalidGenesis(format!(
                "throttled slash from unknown chain {}",
                entry.chain_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::{client_id_for, LaunchInfo};
    use crate::domain::msgs::ConsumerAdditionProposal;
    use ccv_types::{ChainId, ChannelId, ChannelRecord};

    fn state(chain: &str) -> ConsumerState {
        let proposal = ConsumerAdditionProposal {
            chain_id: ChainId::new(chain).unwrap(),
            spawn_time: 0,
            unbonding_period: 100,
            validator_set_cap: 0,
            min_power: 0,
            pre_ccv: false,
        };
        let mut chain = ConsumerChain::from_proposal(&proposal);
        chain.launch = Some(LaunchInfo {
            client_id: client_id_for(0),
            launch_height: 1,
            launch_time: 0,
        });
        ConsumerState {
            chain,
            consumer_genesis: None,
            pending_vsc_packets: vec![],
            assigned_keys: vec![],
            key_records: vec![],
            last_sent: vec![],
            pending_slash_acks: vec![],
            unbonding_index: vec![],
            vsc_send_times: vec![],
            latest_matured_vsc_id: 0,
            throttled_packets: vec![],
        }
    }

    #[test]
    fn test_genesis_validation_table() {
        let cases: Vec<(&str, ProviderGenesis, bool)> = vec![
            ("default", ProviderGenesis::default(), true),
            (
                "zero valset update id",
                ProviderGenesis {
                    valset_update_id: 0,
                    ..Default::default()
                },
                false,
            ),
            (
                "zero id in height map",
                ProviderGenesis {
                    valset_update_id_to_height: vec![VscIdToHeight {
                        valset_update_id: 0,
                        height: 4,
                    }],
                    ..Default::default()
                },
                false,
            ),
            (
                "one launched chain",
                ProviderGenesis {
                    consumer_states: vec![state("chain-a")],
                    ..Default::default()
                },
                true,
            ),
            (
                "duplicate chain",
                ProviderGenesis {
                    consumer_states: vec![state("chain-a"), state("chain-a")],
                    ..Default::default()
                },
                false,
            ),
            (
                "short client id",
                ProviderGenesis {
                    consumer_states: vec![{
                        let mut s = state("chain-a");
                        if let Some(launch) = s.chain.launch.as_mut() {
                            launch.client_id = "short".to_string();
                        }
                        s
                    }],
                    ..Default::default()
                },
                false,
            ),
            (
                "pending packet zero id",
                ProviderGenesis {
                    consumer_states: vec![{
                        let mut s = state("chain-a");
                        s.pending_vsc_packets = vec![VscPacketData::new(vec![], 0, vec![])];
                        s
                    }],
                    ..Default::default()
                },
                false,
            ),
            (
                "established without channel id",
                ProviderGenesis {
                    consumer_states: vec![{
                        let mut s = state("chain-a");
                        s.chain.channel = ChannelRecord {
                            state: ChannelState::Established,
                            channel_id: None,
                        };
                        s
                    }],
                    ..Default::default()
                },
                false,
            ),
            (
                "established with channel id",
                ProviderGenesis {
                    consumer_states: vec![{
                        let mut s = state("chain-a");
                        s.chain.channel = ChannelRecord {
                            state: ChannelState::Established,
                            channel_id: Some(ChannelId::new("channel-0").unwrap()),
                        };
                        s
                    }],
                    ..Default::default()
                },
                true,
            ),
            (
                "op owing nothing",
                ProviderGenesis {
                    unbonding_ops: vec![UnbondingOp::new(
                        1,
                        ConsAddress::from_bytes([1; 20]),
                        BTreeSet::new(),
                    )],
                    ..Default::default()
                },
                false,
            ),
        ];

        for (name, genesis, ok) in cases {
            assert_eq!(genesis.validate().is_ok(), ok, "case {name}");
        }
    }

    #[test]
    fn test_invalid_channel_id_fails_to_parse() {
        let mut s = state("chain-a");
        s.chain.channel = ChannelRecord {
            state: ChannelState::Established,
            channel_id: Some(ChannelId::new("channel-0").unwrap()),
        };
        let genesis = ProviderGenesis {
            consumer_states: vec![s],
            ..Default::default()
        };
        let json = serde_json::to_string(&genesis)
            .unwrap()
            .replace("channel-0", "invalidChannel{}");
        assert!(serde_json::from_str::<ProviderGenesis>(&json).is_err());
    }
}
