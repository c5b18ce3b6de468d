//! Record key layout.
//!
//! `prefix | len(chain) | chain | suffix`, integers big-endian, addresses raw.

use ccv_types::store::KeyBuilder;
use ccv_types::{ChainId, ChannelId, ConsAddress};

pub const PARAMS: u8 = 0x01;
pub const VALSET_UPDATE_ID: u8 = 0x02;
pub const CLIENT_COUNTER: u8 = 0x03;
pub const SLASH_METER: u8 = 0x04;
pub const VSC_ID_TO_HEIGHT: u8 = 0x05;
pub const THROTTLE_GLOBAL: u8 = 0x06;
pub const THROTTLE_NEXT: u8 = 0x07;
pub const UNBONDING_OP: u8 = 0x08;

pub const CONSUMER_CHAIN: u8 = 0x10;
pub const CONSUMER_GENESIS: u8 = 0x11;
pub const CHANNEL_TO_CHAIN: u8 = 0x12;
pub const PENDING_VSC: u8 = 0x13;
pub const ASSIGNED_KEY: u8 = 0x14;
pub const KEY_RECORD: u8 = 0x15;
pub const LAST_SENT: u8 = 0x16;
pub const SLASH_ACKS: u8 = 0x17;
pub const UNBONDING_INDEX: u8 = 0x18;
pub const VSC_SEND_TIME: u8 = 0x19;
pub const LATEST_MATURED: u8 = 0x1A;
pub const THROTTLED_PACKET: u8 = 0x1B;

/// Single-record key.
pub fn global(prefix: u8) -> Vec<u8> {
    vec![prefix]
}

/// `prefix | id`.
pub fn global_id(prefix: u8, id: u64) -> Vec<u8> {
    KeyBuilder::new(prefix).u64(id).build()
}

/// `prefix | chain`, also the scan prefix of every per-chain table.
pub fn chain(prefix: u8, chain_id: &ChainId) -> Vec<u8> {
    KeyBuilder::new(prefix).chain(chain_id).build()
}

/// `prefix | chain | id`.
pub fn chain_id(prefix: u8, chain_id: &ChainId, id: u64) -> Vec<u8> {
    KeyBuilder::new(prefix).chain(chain_id).u64(id).build()
}

/// `prefix | chain | address`.
pub fn chain_addr(prefix: u8, chain_id: &ChainId, addr: &ConsAddress) -> Vec<u8> {
    KeyBuilder::new(prefix)
        .chain(chain_id)
        .bytes(addr.as_bytes())
        .build()
}

/// `CHANNEL_TO_CHAIN | channel`.
pub fn channel(channel_id: &ChannelId) -> Vec<u8> {
    KeyBuilder::new(CHANNEL_TO_CHAIN)
        .bytes(channel_id.as_str().as_bytes())
        .build()
}

/// Trailing address of a `chain_addr` key.
pub fn trailing_addr(key: &[u8]) -> Option<ConsAddress> {
    let start = key.len().checked_sub(20)?;
    let bytes: [u8; 20] = key[start..].try_into().ok()?;
    Some(ConsAddress::from_bytes(bytes))
}
