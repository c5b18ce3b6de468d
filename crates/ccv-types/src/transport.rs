//! # Transport
//!
//! Contract with the inter-chain messaging layer: an outbound
//! [`PacketSender`] port and the typed [`TransportEvent`]s delivered back
//! into a block step. Events are processed synchronously; nothing is carried
//! across blocks except persisted state.

use crate::channel::ChannelOrder;
use crate::errors::{CcvError, CcvResult};
use crate::ids::{ChainId, ChannelId, Timestamp};
use crate::packets::Acknowledgement;
use serde::{Deserialize, Serialize};

/// A packet as seen by the receiving or acknowledging side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Channel the packet travels on (the local end).
    pub channel_id: ChannelId,
    /// Transport sequence number.
    pub sequence: u64,
    /// JSON payload.
    pub data: Vec<u8>,
}

/// Inbound callbacks from the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Consumer side: a channel handshake was initiated locally.
    ChanOpenInit {
        channel_id: ChannelId,
        port_id: String,
        order: ChannelOrder,
        version: String,
        client_id: String,
    },
    /// Provider side: a consumer asked to open a channel.
    ChanOpenTry {
        chain_id: ChainId,
        channel_id: ChannelId,
        port_id: String,
        order: ChannelOrder,
        version: String,
        client_id: String,
    },
    /// Consumer side: the provider accepted the handshake.
    ChanOpenAck {
        channel_id: ChannelId,
        counterparty_version: String,
    },
    /// Provider side: the handshake completed.
    ChanOpenConfirm { channel_id: ChannelId },
    /// A user tried to close the channel.
    ChanCloseInit { channel_id: ChannelId },
    /// The counterparty closed the channel.
    ChanCloseConfirm { channel_id: ChannelId },
    /// A packet arrived.
    RecvPacket(Packet),
    /// A packet we sent was acknowledged.
    Acknowledgement {
        packet: Packet,
        ack: Acknowledgement,
    },
    /// A packet we sent timed out.
    Timeout(Packet),
}

/// Outbound port: send packet bytes over a channel.
pub trait PacketSender {
    /// Send `data` on `channel_id`, returning the assigned sequence number.
    fn send_packet(
        &mut self,
        channel_id: &ChannelId,
        data: Vec<u8>,
        timeout_timestamp: Timestamp,
    ) -> CcvResult<u64>;
}

/// A packet handed to [`InMemoryTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentPacket {
    /// Channel it was sent on.
    pub channel_id: ChannelId,
    /// Assigned sequence.
    pub sequence: u64,
    /// Payload.
    pub data: Vec<u8>,
    /// Timeout timestamp.
    pub timeout_timestamp: Timestamp,
}

/// In-memory transport recording every sent packet.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTransport {
    next_sequence: u64,
    sent: Vec<SentPacket>,
    /// When set, every send fails.
    pub should_fail: bool,
}

impl InMemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Packets sent so far.
    pub fn sent(&self) -> &[SentPacket] {
        &self.sent
    }

    /// Take and clear the sent packets.
    pub fn drain(&mut self) -> Vec<SentPacket> {
        std::mem::take(&mut self.sent)
    }
}

impl PacketSender for InMemoryTransport {
    fn send_packet(
        &mut self,
        channel_id: &ChannelId,
        data: Vec<u8>,
        timeout_timestamp: Timestamp,
    ) -> CcvResult<u64> {
        if self.should_fail {
            return Err(CcvError::Transport {
                channel_id: channel_id.clone(),
                reason: "send disabled".to_string(),
            });
        }
        self.next_sequence += 1;
        self.sent.push(SentPacket {
            channel_id: channel_id.clone(),
            sequence: self.next_sequence,
            data,
            timeout_timestamp,
        });
        Ok(self.next_sequence)
    }
}
