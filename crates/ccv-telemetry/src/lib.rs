//! # CCV Telemetry
//!
//! Logging and metrics setup for processes embedding the CCV modules.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ccv_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::for_module("provider")).expect("telemetry");
//!     // Provider and consumer logs now go through the configured subscriber.
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CCV_SERVICE_NAME` | `ccv` | Service name |
//! | `CCV_LOG_LEVEL` | `info` | Filter directive, falls back to `RUST_LOG` |
//! | `CCV_JSON_LOGS` | `false` (`true` in containers) | JSON lines output |
//! | `NO_COLOR` | unset | Disable ANSI colors |

#![warn(clippy::all)]

mod config;
mod logging;
mod metrics;

pub use config::{TelemetryConfig, DEFAULT_LOG_LEVEL, DEFAULT_SERVICE_NAME};
pub use logging::{env_filter, init_logging};
pub use metrics::encode_metrics;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to encode metrics: {0}")]
    Metrics(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging for the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)
}
