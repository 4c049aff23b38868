//! # ST Telemetry
//!
//! Logging and metrics for the SalaryTalk negotiation engine.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter`, pretty or JSON output
//! - **Metrics**: Prometheus counters, a gauge and a latency histogram
//! - **Observer**: `PrometheusObserver`, plugged into the engine's observer port
//!
//! ## Usage
//!
//! ```rust,ignore
//! use st_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! // Build the engine with `Arc::new(PrometheusObserver)`
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ST_SERVICE_NAME` | `salary-talk` | Service name in the startup log |
//! | `ST_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `ST_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `ST_JSON_LOGS` | `false` | JSON formatted logs |

#![warn(missing_docs)]

mod config;
pub mod metrics;
mod observer;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, OFFERS_CREATED, OFFERS_TRACKED, OPERATIONS,
    OPERATION_DURATION, REFRESH_RECORD_FAILURES,
};
pub use observer::PrometheusObserver;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// The configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and register metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first, so nothing observed during startup is lost
    let metrics = register_metrics()?;
    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}
