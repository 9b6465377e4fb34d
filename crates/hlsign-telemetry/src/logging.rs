//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,hlsign=debug";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event, for log shipping.
    Json,
    /// Multi-line human-readable output.
    #[default]
    Pretty,
}

impl LogFormat {
    /// JSON when `RUST_ENV` is `production`, pretty otherwise.
    pub fn from_rust_env(rust_env: Option<&str>) -> Self {
        match rust_env {
            Some("production") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `None` falls back to `RUST_LOG`, then [`DEFAULT_FILTER`].
    pub filter: Option<String>,
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Settings derived from the process environment.
    pub fn from_env() -> Self {
        let rust_env = std::env::var("RUST_ENV").ok();
        Self {
            filter: None,
            format: LogFormat::from_rust_env(rust_env.as_deref()),
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Build the `EnvFilter` for these settings.
    pub fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        match &self.filter {
            Some(directives) => {
                EnvFilter::try_new(directives).map_err(|e| TelemetryError::InvalidFilter {
                    filter: directives.clone(),
                    reason: e.to_string(),
                })
            }
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
        }
    }
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed or the filter does not parse.
pub fn init_logging(config: &LoggingConfig) -> TelemetryResult<()> {
    let env_filter = config.env_filter()?;

    // Logs go to stderr so signed payloads on stdout stay machine-readable.
    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
