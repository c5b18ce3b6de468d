//! # Error Types
//!
//! Error taxonomy shared by the provider and consumer sides of CCV.
//!
//! Every error belongs to exactly one [`ErrorKind`]. The kind decides how a
//! block step reacts:
//!
//! | Kind | Reaction |
//! |------|----------|
//! | `Validation` | Rejected locally, error acknowledgement, no state mutation |
//! | `Policy` | Surfaced to the caller as a failed message or packet |
//! | `Invariant` | Logged, the affected chain's write-set is discarded, the block continues |
//! | `Transport` | Recovery path (requeue or chain marked unreachable) |
//! | `Store` | Propagated; the enclosing block write-set is discarded |

use crate::ids::{ChainId, ChannelId, ConsAddress};
use crate::channel::ChannelState;
use thiserror::Error;

/// Coarse classification of a [`CcvError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, unknown chain or validator, invalid key.
    Validation,
    /// Input was well-formed but is not permitted.
    Policy,
    /// Internal state is inconsistent for one chain.
    Invariant,
    /// The messaging transport failed to deliver.
    Transport,
    /// The backing key-value store failed.
    Store,
}

/// Errors produced by the CCV state machines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CcvError {
    // ---------------------------------------------------------------- validation
    /// No consumer chain is registered under this id.
    #[error("Unknown consumer chain: {0}")]
    UnknownChain(ChainId),

    /// No consumer chain is bound to this channel.
    #[error("Unknown channel: {0}")]
    UnknownChannel(ChannelId),

    /// The provider staking module has no validator with this address.
    #[error("Unknown validator: {0}")]
    UnknownValidator(ConsAddress),

    /// The consumer key could not be parsed or is not a valid point.
    #[error("Invalid consumer key: {0}")]
    InvalidKey(String),

    /// Packet bytes or packet fields are malformed.
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    /// A chain identifier is empty or too long.
    #[error("Invalid chain id: {0:?}")]
    InvalidChainId(String),

    /// Handshake parameters do not match the CCV channel requirements.
    #[error("Invalid handshake: {0}")]
    InvalidHandshake(String),

    /// A slash packet references a VSC id the provider does not know.
    #[error("Unknown valset update id {vsc_id} for chain {chain_id}")]
    UnknownVscId { chain_id: ChainId, vsc_id: u64 },

    /// Genesis state or parameters failed validation.
    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),

    /// Parameters failed validation.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Double-vote evidence is not a valid equivocation.
    #[error("Invalid evidence: {0}")]
    InvalidEvidence(String),

    // ---------------------------------------------------------------- policy
    /// The consumer key is (or was) bound to another identity on this chain.
    #[error("Consumer key {consumer_addr} already assigned on chain {chain_id}")]
    AlreadyAssigned {
        chain_id: ChainId,
        consumer_addr: ConsAddress,
    },

    /// A new provider validator's consensus address is a consumer key on some chain.
    #[error("Consensus address {0} is already in use as a consumer key")]
    ConsensusKeyInUse(ConsAddress),

    /// The message type is not allowed on this chain.
    #[error("Message type {0} is not allowed")]
    DisallowedMessage(String),

    /// The global slash throttle queue is full.
    #[error("Throttle queue full: {size} entries, max {max}")]
    ThrottleQueueFull { size: u64, max: u64 },

    /// The chain id is already registered (possibly closed).
    #[error("Consumer chain already registered: {0}")]
    ChainAlreadyRegistered(ChainId),

    /// A channel for this chain already exists.
    #[error("Consumer chain {0} already has a CCV channel")]
    ChannelAlreadyExists(ChainId),

    /// Closing a CCV channel from this side is not allowed.
    #[error("CCV channel {0} cannot be closed by a user")]
    CloseNotAllowed(ChannelId),

    // ---------------------------------------------------------------- invariant
    /// A VSC packet id did not strictly increase in a per-chain queue.
    #[error("Duplicate VSC id {vsc_id} for chain {chain_id} (last queued {last})")]
    DuplicateVscId {
        chain_id: ChainId,
        vsc_id: u64,
        last: u64,
    },

    /// A channel state transition is not allowed.
    #[error("Invalid channel transition for {chain_id}: {from:?} -> {to:?}")]
    InvalidChannelTransition {
        chain_id: ChainId,
        from: ChannelState,
        to: ChannelState,
    },

    /// Internal records are inconsistent.
    #[error("Corrupted state: {0}")]
    CorruptedState(String),

    // ---------------------------------------------------------------- transport
    /// The transport could not send a packet.
    #[error("Transport error on channel {channel_id}: {reason}")]
    Transport {
        channel_id: ChannelId,
        reason: String,
    },

    // ---------------------------------------------------------------- store
    /// Key-value store failure.
    #[error("Store error: {0}")]
    Store(String),

    /// A stored value could not be decoded.
    #[error("Codec error: {0}")]
    Codec(String),
}

impl CcvError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownChain(_)
            | Self::UnknownChannel(_)
            | Self::UnknownValidator(_)
            | Self::InvalidKey(_)
            | Self::InvalidPacket(_)
            | Self::InvalidChainId(_)
            | Self::InvalidHandshake(_)
            | Self::UnknownVscId { .. }
            | Self::InvalidGenesis(_)
            | Self::InvalidParams(_)
            | Self::InvalidEvidence(_) => ErrorKind::Validation,

            Self::AlreadyAssigned { .. }
            | Self::ConsensusKeyInUse(_)
            | Self::DisallowedMessage(_)
            | Self::ThrottleQueueFull { .. }
            | Self::ChainAlreadyRegistered(_)
            | Self::ChannelAlreadyExists(_)
            | Self::CloseNotAllowed(_) => ErrorKind::Policy,

            Self::DuplicateVscId { .. }
            | Self::InvalidChannelTransition { .. }
            | Self::CorruptedState(_) => ErrorKind::Invariant,

            Self::Transport { .. } => ErrorKind::Transport,

            Self::Store(_) | Self::Codec(_) => ErrorKind::Store,
        }
    }

    /// True if the error only invalidates the current chain's update.
    pub fn is_invariant_violation(&self) -> bool {
        self.kind() == ErrorKind::Invariant
    }
}

/// Result type for CCV operations.
pub type CcvResult<T> = Result<T, CcvError>;
