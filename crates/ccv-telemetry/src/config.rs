//! Telemetry configuration from environment variables.

use std::env;

/// Default `EnvFilter` directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default service name attached to every log line.
pub const DEFAULT_SERVICE_NAME: &str = "ccv";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name recorded on the startup event.
    pub service_name: String,

    /// `EnvFilter` directive, e.g. `info` or `ccv_provider=debug,info`.
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,

    /// Colored output for the plain format.
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CCV_SERVICE_NAME`: Service name (default: ccv)
    /// - `CCV_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `CCV_JSON_LOGS`: JSON output (default: true in containers)
    /// - `NO_COLOR`: Disable ANSI colors when set
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`TelemetryConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("CCV_SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),

            log_level: lookup("CCV_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),

            json_logs: lookup("CCV_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            ansi: lookup("NO_COLOR").is_none(),
        }
    }

    /// Configuration for one side of the protocol, e.g. `ccv-provider`.
    pub fn for_module(module: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("{}-{}", config.service_name, module);
        config
    }
}
