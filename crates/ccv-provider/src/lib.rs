//! # CCV Provider
//!
//! Provider side of Cross-Chain Validation. The provider chain lends its
//! validator set to consumer chains: it launches consumers at their spawn
//! time, streams validator set changes to them over one ordered channel per
//! consumer, jails or tombstones validators on their slash requests, and
//! holds unbondings until every consumer reports that the change matured.
//!
//! ## Block Step
//!
//! ```text
//! BeginBlock ── stop chains past stop time, launch chains past spawn time
//!     │         replenish slash meter, drain throttle queue
//!     │
//! Messages / transport events ── proposals, key assignment, handshake,
//!     │                           slash and VSC-matured packets
//!     │
//! EndBlock ── per established consumer: diff → VSC packet → send
//!             VSC timeout check, valset update id += 1
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Strictly Increasing VSC Ids | Pending packets per consumer are ordered by a global id |
//! | Key Stickiness | A consumer address is bound to one provider validator per chain, forever |
//! | Bounded Jailing | Downtime jailing per replenish period stays within the slash meter |
//! | Strict Throttle Order | Queued slashes are applied head-first; maturity packets wait behind them |
//! | Chain Isolation | An inconsistency on one consumer never blocks the others |
//!
//! ## Module Structure
//!
//! ```text
//! ccv-provider/
//! ├── domain/      # Chains, params, key assignment, throttle, genesis, evidence
//! ├── ports/       # ProviderApi (inbound), StakingKeeper + PacketSender (outbound)
//! ├── adapters/    # In-memory staking module
//! ├── store/       # Typed provider records over KeyValueStore
//! ├── service/     # ProviderService block steps and transport callbacks
//! └── metrics.rs   # Optional Prometheus metrics
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod store;

// Re-exports
pub use adapters::{InMemoryStaking, SlashRecord};
pub use domain::{
    ConsumerAdditionProposal, ConsumerChain, ConsumerModificationProposal, ConsumerRemovalProposal,
    ConsumerState,
    DuplicateVoteEvidence, KeyStatus, ProviderGenesis, ProviderMsg, ProviderParams, SlashMeter,
    ValidatorInfo, Vote,
};
pub use ports::{ProviderApi, StakingKeeper};
pub use service::{ProviderDependencies, ProviderService, PROVIDER_CLIENT_ID};
pub use store::ProviderStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
