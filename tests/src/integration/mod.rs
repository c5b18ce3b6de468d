//! # Cross-Chain Flows
//!
//! Each module exercises the provider and its consumers together through
//! the [`Network`](crate::harness::Network) relayer.

pub mod consumer_flows;
pub mod determinism;
pub mod genesis;
pub mod key_assignment;
pub mod lifecycle;
pub mod throttle;
