//! # Adapters
//!
//! In-memory collaborators for tests and simulations.

pub mod staking;

pub use staking::{InMemoryStaking, SlashRecord};
