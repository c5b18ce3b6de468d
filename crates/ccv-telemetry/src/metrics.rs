//! Prometheus text exposition of the metrics registered by the CCV crates.
//!
//! The provider and consumer register into the default registry when built
//! with their `metrics` feature; this module only encodes it.

use crate::TelemetryError;
use prometheus::{Encoder, TextEncoder};

/// Encode every registered metric in the Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{register_int_counter, IntCounter};

    #[test]
    fn test_encode_includes_registered_counter() {
        let counter: IntCounter =
            register_int_counter!("ccv_telemetry_test_total", "Test counter").unwrap();
        counter.inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("ccv_telemetry_test_total 1"));
    }
}
