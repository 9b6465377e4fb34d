//! Structured logging for the hlsign tools.
//!
//! Libraries only emit `tracing` events; binaries call [`init_logging`] once
//! at startup to install a subscriber.

pub mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogFormat, LoggingConfig, DEFAULT_FILTER};
