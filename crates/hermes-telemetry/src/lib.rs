//! Logging setup for Hermes.
//!
//! Every Hermes crate emits structured events through `tracing`; this crate
//! installs the subscriber that formats them.
//!
//! # Example
//!
//! ```no_run
//! use hermes_telemetry::{init_logging, LogConfig};
//!
//! // Ignore the error if a subscriber is already installed.
//! let _ = init_logging(&LogConfig::for_tests());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogWriter};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
