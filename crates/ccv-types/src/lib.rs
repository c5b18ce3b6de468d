//! # CCV Types
//!
//! Types shared by both ends of Cross-Chain Validation.
//!
//! A provider chain streams validator set changes (VSC packets) to its
//! consumer chains over an ordered channel and receives slash requests and
//! VSC maturity notifications back. This crate holds what both sides agree
//! on:
//!
//! | Module | Contents |
//! |--------|----------|
//! | `ids` | Chain, channel and validator identities, consensus keys |
//! | `packets` | Packet payloads and acknowledgements (JSON) |
//! | `channel` | Channel lifecycle state machine and handshake checks |
//! | `context` | Height and time of the executing block |
//! | `transport` | Outbound packet port and inbound transport events |
//! | `fraction` | Exact decimal fractions for policy parameters |
//! | `store` | Ordered key-value port, in-memory/cached/RocksDB adapters |
//! | `errors` | Error taxonomy |
//!
//! ## Module Structure
//!
//! ```text
//! ccv-types/
//! ├── ids.rs, packets.rs, channel.rs, transport.rs, fraction.rs, context.rs
//! ├── errors.rs
//! └── store/       # KeyValueStore, InMemoryKvStore, CachedKvStore, RocksDbStore
//! ```

#![warn(clippy::all)]

pub mod channel;
pub mod context;
pub mod errors;
pub mod fraction;
pub mod ids;
pub mod packets;
pub mod store;
pub mod transport;

// Re-exports
pub use channel::{
    validate_handshake, ChannelOrder, ChannelRecord, ChannelState, CCV_VERSION, CONSUMER_PORT_ID,
    PROVIDER_PORT_ID,
};
pub use context::BlockContext;
pub use errors::{CcvError, CcvResult, ErrorKind};
pub use fraction::Fraction;
pub use ids::{
    validate_identifier, ChainId, ChannelId, ConsAddress, ConsensusPubKey, Timestamp,
    ED25519_KEY_TYPE, MAX_CHAIN_ID_LEN, SECP256K1_KEY_TYPE,
};
pub use packets::{
    decode_packet, encode_packet, Acknowledgement, ConsumerPacketData, Infraction,
    SlashPacketData, SlashedValidator, ValidatorUpdate, VscMaturedPacketData, VscPacketData,
};
pub use store::{
    BatchOperation, CachedKvStore, InMemoryKvStore, KeyBuilder, KeyValueStore, TypedStore,
};
pub use transport::{InMemoryTransport, Packet, PacketSender, SentPacket, TransportEvent};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
