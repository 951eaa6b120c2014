//! Structured logging for Hermes.
//!
//! Installs a global `tracing` subscriber with an [`EnvFilter`] and a JSON or
//! pretty formatting layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//!
//! tracing::info!(function = "hello", "invoking handler");
//! ```

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::TestWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Where formatted log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogWriter {
    /// Standard output.
    Stdout,
    /// Standard error.
    #[default]
    Stderr,
    /// The test harness's captured output.
    Test,
}

impl LogWriter {
    fn make_writer(self) -> BoxMakeWriter {
        match self {
            Self::Stdout => BoxMakeWriter::new(std::io::stdout),
            Self::Stderr => BoxMakeWriter::new(std::io::stderr),
            Self::Test => BoxMakeWriter::new(TestWriter::default()),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directives (e.g. `"warn"`, `"hermes_core=debug,info"`).
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to include span events (new, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Output destination.
    pub writer: LogWriter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "warn".to_string(),
            json_format: false,
            span_events: false,
            file_line_info: false,
            include_target: true,
            writer: LogWriter::Stderr,
        }
    }
}

impl LogConfig {
    /// Human-readable debug output with span lifecycle events.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            span_events: true,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// Debug output routed through the test harness, so it only shows for
    /// failing tests.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            level: "debug".to_string(),
            writer: LogWriter::Test,
            ..Self::default()
        }
    }

    /// Sets the filter directives.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Switches to JSON output.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.json_format = true;
        self
    }
}

/// Initializes the global logging subscriber.
///
/// A disabled config is a no-op. Calling this when a global subscriber is
/// already installed returns [`TelemetryError::LoggingInit`]; callers that
/// may initialize more than once (test suites) can ignore that error.
///
/// # Errors
///
/// - [`TelemetryError::InvalidConfig`] if the filter directives do not parse
/// - [`TelemetryError::LoggingInit`] if a global subscriber is already set
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(config.writer.make_writer())
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(config.writer.make_writer())
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}

/// Creates an env filter from filter directives.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidConfig`] if the directives are invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::InvalidConfig(format!("Invalid log level {filter:?}: {e}")))
}
