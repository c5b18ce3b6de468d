//! # Channel Lifecycle
//!
//! State machine binding a consumer chain to its CCV channel.
//!
//! ```text
//! Uninitialized ──open──→ HandshakeInProgress ──confirm──→ Established
//!       │                        │                             │
//!       └────────────────────────┴─────────close───────────────┴──→ Closed
//! ```
//!
//! `Closed` is terminal.

use crate::errors::{CcvError, CcvResult};
use crate::ids::{ChainId, ChannelId};
use serde::{Deserialize, Serialize};

/// Port bound by the provider module.
pub const PROVIDER_PORT_ID: &str = "provider";

/// Port bound by the consumer module.
pub const CONSUMER_PORT_ID: &str = "consumer";

/// Only supported CCV channel version.
pub const CCV_VERSION: &str = "1";

/// Channel ordering requested during the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelOrder {
    /// Packets delivered in send order.
    Ordered,
    /// Packets delivered in any order.
    Unordered,
}

/// State of a consumer chain's CCV channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelState {
    /// No handshake has started.
    #[default]
    Uninitialized,
    /// The handshake has started but is not confirmed.
    HandshakeInProgress,
    /// The channel is open and carries CCV packets.
    Established,
    /// The channel closed; the consumer is no longer secured.
    Closed,
}

impl ChannelState {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: ChannelState) -> bool {
        match (self, next) {
            (Self::Uninitialized, Self::HandshakeInProgress) => true,
            (Self::HandshakeInProgress, Self::Established) => true,
            (Self::Uninitialized | Self::HandshakeInProgress | Self::Established, Self::Closed) => {
                true
            }
            _ => false,
        }
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Channel record kept per consumer chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Current state.
    pub state: ChannelState,
    /// Channel id, known once the handshake starts.
    pub channel_id: Option<ChannelId>,
}

impl ChannelRecord {
    /// Transition to a new state.
    pub fn transition_to(&mut self, chain_id: &ChainId, next: ChannelState) -> CcvResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(CcvError::InvalidChannelTransition {
                chain_id: chain_id.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// True once the channel is established and not closed.
    pub fn is_established(&self) -> bool {
        self.state == ChannelState::Established
    }
}

/// Check the parameters of an opening handshake against CCV requirements.
pub fn validate_handshake(
    order: ChannelOrder,
    port_id: &str,
    expected_port: &str,
    version: &str,
) -> CcvResult<()> {
    if order != ChannelOrder::Ordered {
        return Err(CcvError::InvalidHandshake(
            "CCV channel must be ordered".to_string(),
        ));
    }
    if port_id != expected_port {
        return Err(CcvError::InvalidHandshake(format!(
            "invalid port {port_id:?}, expected {expected_port:?}"
        )));
    }
    if version != CCV_VERSION {
        return Err(CcvError::InvalidHandshake(format!(
            "invalid version {version:?}, expected {CCV_VERSION:?}"
        )));
    }
    Ok(())
}
