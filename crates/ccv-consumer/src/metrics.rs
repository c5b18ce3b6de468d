//! # Consumer Metrics
//!
//! Prometheus metrics for the consumer side of CCV.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! ccv-consumer = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `ccv_consumer_vsc_packets_received_total` - VSC packets applied
//! - `ccv_consumer_packets_sent_total` - Packets sent to the provider (by kind)
//! - `ccv_consumer_slash_requests_total` - Slash requests queued (by infraction)
//! - `ccv_consumer_pending_packets` - Gauge of packets waiting to be sent
//! - `ccv_consumer_validators` - Gauge of the cross-chain validator set size

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref VSC_PACKETS_RECEIVED: IntCounter = register_int_counter!(
        "ccv_consumer_vsc_packets_received_total",
        "Total number of VSC packets received from the provider"
    )
    .expect("Failed to create VSC_PACKETS_RECEIVED metric");

    pub static ref PACKETS_SENT: IntCounterVec = register_int_counter_vec!(
        "ccv_consumer_packets_sent_total",
        "Total number of packets sent to the provider",
        &["kind"]
    )
    .expect("Failed to create PACKETS_SENT metric");

    pub static ref SLASH_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "ccv_consumer_slash_requests_total",
        "Total number of slash requests queued for the provider",
        &["infraction"]
    )
    .expect("Failed to create SLASH_REQUESTS metric");

    pub static ref PENDING_PACKETS: IntGauge = register_int_gauge!(
        "ccv_consumer_pending_packets",
        "Number of consumer packets waiting to be sent"
    )
    .expect("Failed to create PENDING_PACKETS metric");

    pub static ref VALIDATORS: IntGauge = register_int_gauge!(
        "ccv_consumer_validators",
        "Size of the cross-chain validator set"
    )
    .expect("Failed to create VALIDATORS metric");
}

#[cfg(feature = "metrics")]
pub fn record_vsc_packet_received() {
    VSC_PACKETS_RECEIVED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_packet_sent(kind: &str) {
    PACKETS_SENT.with_label_values(&[kind]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_slash_request(infraction: &str) {
    SLASH_REQUESTS.with_label_values(&[infraction]).inc();
}

#[cfg(feature = "metrics")]
pub fn set_pending_packets(count: usize) {
    PENDING_PACKETS.set(count as i64);
}

#[cfg(feature = "metrics")]
pub fn set_validator_count(count: usize) {
    VALIDATORS.set(count as i64);
}

#[cfg(not(feature = "metrics"))]
pub fn record_vsc_packet_received() {}

#[cfg(not(feature = "metrics"))]
pub fn record_packet_sent(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_slash_request(_infraction: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_pending_packets(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn set_validator_count(_count: usize) {}
