//! # Provider Metrics
//!
//! Prometheus metrics for the provider side of CCV.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! ccv-provider = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `ccv_provider_vsc_packets_sent_total` - VSC packets handed to the transport
//! - `ccv_provider_slash_packets_total` - Slash packets received (by infraction and outcome)
//! - `ccv_provider_throttle_queue_size` - Gauge of the global throttle queue
//! - `ccv_provider_slash_meter_allowance` - Gauge of the slash meter allowance
//! - `ccv_provider_consumers_stopped_total` - Consumer chains stopped (by reason)
//! - `ccv_provider_key_assignments_total` - Accepted consumer key assignments

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// VSC packets handed to the transport
    pub static ref VSC_PACKETS_SENT: IntCounter = register_int_counter!(
        "ccv_provider_vsc_packets_sent_total",
        "Total number of VSC packets sent to consumer chains"
    )
    .expect("Failed to create VSC_PACKETS_SENT metric");

    /// Slash packets received, labeled by infraction and outcome
    pub static ref SLASH_PACKETS: IntCounterVec = register_int_counter_vec!(
        "ccv_provider_slash_packets_total",
        "Total number of slash packets received from consumer chains",
        &["infraction", "outcome"]
    )
    .expect("Failed to create SLASH_PACKETS metric");

    /// Global throttle queue size
    pub static ref THROTTLE_QUEUE_SIZE: IntGauge = register_int_gauge!(
        "ccv_provider_throttle_queue_size",
        "Number of slash packets waiting in the global throttle queue"
    )
    .expect("Failed to create THROTTLE_QUEUE_SIZE metric");

    /// Slash meter allowance
    pub static ref SLASH_METER_ALLOWANCE: IntGauge = register_int_gauge!(
        "ccv_provider_slash_meter_allowance",
        "Current slash meter allowance in voting power"
    )
    .expect("Failed to create SLASH_METER_ALLOWANCE metric");

    /// Consumer chains stopped, labeled by reason
    pub static ref CONSUMERS_STOPPED: IntCounterVec = register_int_counter_vec!(
        "ccv_provider_consumers_stopped_total",
        "Total number of consumer chains stopped",
        &["reason"]
    )
    .expect("Failed to create CONSUMERS_STOPPED metric");

    /// Accepted key assignments
    pub static ref KEY_ASSIGNMENTS: IntCounter = register_int_counter!(
        "ccv_provider_key_assignments_total",
        "Total number of accepted consumer key assignments"
    )
    .expect("Failed to create KEY_ASSIGNMENTS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_vsc_packet_sent() {
    VSC_PACKETS_SENT.inc();
}

/// Record a slash packet with its outcome (`applied`, `queued`, `ignored`, `rejected`)
#[cfg(feature = "metrics")]
pub fn record_slash_packet(infraction: &str, outcome: &str) {
    SLASH_PACKETS.with_label_values(&[infraction, outcome]).inc();
}

#[cfg(feature = "metrics")]
pub fn set_throttle_queue_size(size: u64) {
    THROTTLE_QUEUE_SIZE.set(size as i64);
}

#[cfg(feature = "metrics")]
pub fn set_slash_meter_allowance(allowance: i64) {
    SLASH_METER_ALLOWANCE.set(allowance);
}

#[cfg(feature = "metrics")]
pub fn record_consumer_stopped(reason: &str) {
    CONSUMERS_STOPPED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_key_assignment() {
    KEY_ASSIGNMENTS.inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_vsc_packet_sent() {}

#[cfg(not(feature = "metrics"))]
pub fn record_slash_packet(_infraction: &str, _outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_throttle_queue_size(_size: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn set_slash_meter_allowance(_allowance: i64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_consumer_stopped(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_key_assignment() {}
