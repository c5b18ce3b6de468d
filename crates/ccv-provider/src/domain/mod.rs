//! # Domain Module
//!
//! Provider-side CCV types and pure algorithms.

pub mod chain;
pub mod evidence;
pub mod genesis;
pub mod key_assignment;
pub mod msgs;
pub mod params;
pub mod throttle;
pub mod unbonding;
pub mod validator_set;

pub use chain::*;
pub use evidence::*;
pub use genesis::*;
pub use key_assignment::*;
pub use msgs::*;
pub use params::*;
pub use throttle::*;
pub use unbonding::*;
pub use validator_set::*;
