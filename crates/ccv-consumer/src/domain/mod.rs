//! # Domain Module
//!
//! Consumer-side CCV types and pure algorithms.

pub mod filter;
pub mod genesis;
pub mod params;
pub mod validators;

pub use filter::*;
pub use genesis::*;
pub use params::*;
pub use validators::*;
