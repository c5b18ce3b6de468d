//! # CCV Test Suite
//!
//! Unified test crate driving one provider and several consumers in the
//! same process.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Network: block production and packet relaying
//! │
//! └── integration/      # Cross-chain flows
//!     ├── lifecycle.rs
//!     ├── key_assignment.rs
//!     ├── throttle.rs
//!     ├── consumer_flows.rs
//!     ├── genesis.rs
//!     └── determinism.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ccv-tests
//!
//! # By flow
//! cargo test -p ccv-tests integration::throttle::
//! ```

pub mod harness;
pub mod integration;
