//! # CCV Consumer
//!
//! Consumer side of Cross-Chain Validation. A consumer chain runs with the
//! provider's validator set: it applies the validator set changes (VSC
//! packets) the provider streams over the CCV channel, tells the provider
//! when each change has matured, and forwards slash requests for
//! misbehaviour it observes.
//!
//! ## Block Step
//!
//! ```text
//! BeginBlock ── HeightToVSCID(h+1) = HeightToVSCID(h)
//!     │
//! RecvPacket(VSC) ── pending changes, maturity time, slash acks
//!     │
//! Slash hook ── slash packet queued (one outstanding downtime per validator)
//!     │
//! EndBlock ── changeover (pre-CCV) | matured VSCs queued → packets sent
//!             (one slash in flight) → validator updates returned
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Single Provider Channel | Packets are only accepted on the channel the handshake opened |
//! | One Slash In Flight | Nothing is sent while a slash packet awaits its acknowledgement |
//! | Ordered Maturity | VSC-matured packets are queued in id order |
//! | Closed Is Terminal | A closed channel never reopens; the chain keeps producing blocks |
//!
//! ## Module Structure
//!
//! ```text
//! ccv-consumer/
//! ├── domain/      # Params, genesis, validator set merging, message filter
//! ├── ports/       # ConsumerApi (inbound), PacketSender (outbound)
//! ├── store/       # Typed consumer records over KeyValueStore
//! ├── service/     # ConsumerService block steps and transport callbacks
//! └── metrics.rs   # Optional Prometheus metrics
//! ```

#![warn(clippy::all)]

pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod store;

// Re-exports
pub use domain::{
    is_message_allowed, ConsumerGenesis, ConsumerParams, CrossChainValidatorSet, HeightToVscId,
    InFlightPacket, MaturingVscPacket,
};
pub use ports::ConsumerApi;
pub use service::{ConsumerDependencies, ConsumerService};
pub use store::ConsumerStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
