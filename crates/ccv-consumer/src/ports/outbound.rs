//! # Outbound Ports
//!
//! The consumer only drives the packet transport; validator updates are
//! returned to the host from `end_block`.

pub use ccv_types::PacketSender;
