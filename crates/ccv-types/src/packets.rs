//! # Packet Data
//!
//! Payloads exchanged over the CCV channel. Packet data is JSON encoded;
//! struct field order is fixed and all lists are built in a deterministic
//! order, so two replicas produce byte-identical payloads.

use crate::errors::{CcvError, CcvResult};
use crate::ids::{ConsAddress, ConsensusPubKey};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A validator power change as understood by the consumer's consensus engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    /// Consumer-side consensus key.
    pub pub_key: ConsensusPubKey,
    /// New voting power; `0` removes the validator.
    pub power: i64,
}

impl ValidatorUpdate {
    /// Create an update.
    pub fn new(pub_key: ConsensusPubKey, power: i64) -> Self {
        Self { pub_key, power }
    }

    /// Consumer consensus address of the key.
    pub fn address(&self) -> ConsAddress {
        self.pub_key.address()
    }
}

/// Provider → consumer validator set change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VscPacketData {
    /// Updates sorted by consumer consensus address.
    pub validator_updates: Vec<ValidatorUpdate>,
    /// Global, strictly increasing id.
    pub valset_update_id: u64,
    /// Consumer addresses whose downtime slash request was handled.
    pub slash_acks: Vec<ConsAddress>,
}

impl VscPacketData {
    /// Create packet data.
    pub fn new(
        validator_updates: Vec<ValidatorUpdate>,
        valset_update_id: u64,
        slash_acks: Vec<ConsAddress>,
    ) -> Self {
        Self {
            validator_updates,
            valset_update_id,
            slash_acks,
        }
    }

    /// Stateless validation.
    pub fn validate(&self) -> CcvResult<()> {
        if self.valset_update_id == 0 {
            return Err(CcvError::InvalidPacket(
                "valset update id cannot be zero".to_string(),
            ));
        }
        if let Some(update) = self.validator_updates.iter().find(|u| u.power < 0) {
            return Err(CcvError::InvalidPacket(format!(
                "negative power {} for {}",
                update.power,
                update.address()
            )));
        }
        Ok(())
    }
}

/// Kind of misbehaviour reported by a consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Infraction {
    /// Missed too many blocks.
    Downtime,
    /// Signed two conflicting blocks.
    DoubleSign,
}

/// Validator reference in a slash packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashedValidator {
    /// Consumer consensus address.
    pub address: ConsAddress,
    /// Power on the consumer at infraction time.
    pub power: i64,
}

/// Consumer → provider slash request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashPacketData {
    /// The misbehaving validator.
    pub validator: SlashedValidator,
    /// VSC id in effect at the infraction height (`0` means the genesis set).
    pub valset_update_id: u64,
    /// Infraction kind.
    pub infraction: Infraction,
}

impl SlashPacketData {
    /// Stateless validation.
    pub fn validate(&self) -> CcvResult<()> {
        if self.validator.power <= 0 {
            return Err(CcvError::InvalidPacket(format!(
                "slash packet power must be positive, got {}",
                self.validator.power
            )));
        }
        Ok(())
    }
}

/// Consumer → provider notification that a VSC's unbonding period elapsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VscMaturedPacketData {
    /// Matured VSC id.
    pub valset_update_id: u64,
}

impl VscMaturedPacketData {
    /// Stateless validation.
    pub fn validate(&self) -> CcvResult<()> {
        if self.valset_update_id == 0 {
            return Err(CcvError::InvalidPacket(
                "matured valset update id cannot be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Packets sent by a consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ConsumerPacketData {
    /// Slash request.
    Slash(SlashPacketData),
    /// VSC maturity notification.
    VscMatured(VscMaturedPacketData),
}

impl ConsumerPacketData {
    /// Stateless validation of the contained data.
    pub fn validate(&self) -> CcvResult<()> {
        match self {
            Self::Slash(data) => data.validate(),
            Self::VscMatured(data) => data.validate(),
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Slash(_) => "slash",
            Self::VscMatured(_) => "vsc_matured",
        }
    }
}

/// Acknowledgement written by the receiving side of a packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acknowledgement {
    /// Packet handled.
    Result(Vec<u8>),
    /// Packet rejected.
    Error(String),
}

impl Acknowledgement {
    /// Success acknowledgement with the conventional single `0x01` byte.
    pub fn success() -> Self {
        Self::Result(vec![1])
    }

    /// Error acknowledgement.
    pub fn error(reason: impl ToString) -> Self {
        Self::Error(reason.to_string())
    }

    /// True for a success acknowledgement.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Result(_))
    }
}

/// Encode packet data as JSON bytes.
pub fn encode_packet<T: Serialize>(data: &T) -> CcvResult<Vec<u8>> {
    serde_json::to_vec(data).map_err(|e| CcvError::Codec(e.to_string()))
}

/// Decode JSON packet bytes.
pub fn decode_packet<T: DeserializeOwned>(bytes: &[u8]) -> CcvResult<T> {
    serde_json::from_slice(bytes).map_err(|e| CcvError::InvalidPacket(e.to_string()))
}
