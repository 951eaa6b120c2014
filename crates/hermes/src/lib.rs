//! # Hermes
//!
//! Invoke serverless HTTP handlers locally, as if through an API gateway.
//!
//! Given a service directory with a `serverless.yml`, Hermes matches a
//! request line such as `"GET api/res1/42?verbose=1"` against the declared
//! `http` events, builds the gateway event the handler would receive, makes
//! the declared environment visible, runs the handler registered for the
//! function's `handler:` reference, and returns a normalized response.
//!
//! ```text
//! "GET api/res1/42" ─▶ RouteTable ─▶ ApiGatewayEvent ─▶ Handler ─▶ NormalizedResponse
//!                          ▲                                ▲
//!                    serverless.yml                  HandlerRegistry
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hermes::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), InvokeError> {
//!     let mut registry = HandlerRegistry::new();
//!     registry.direct("handler.hello", |event, _ctx| async move {
//!         Ok(HandlerResponse::ok().json(&json!({ "input": event }))?)
//!     });
//!
//!     let invoker = Invoker::discover(registry)?;
//!     let response = invoker.invoke("GET api/hello").await?;
//!     assert_eq!(response.body["input"]["httpMethod"], "GET");
//!     Ok(())
//! }
//! ```
//!
//! A handler that returns an error, panics, or drops its callback yields a
//! `502` response carrying `debug_error_message` and `debug_error_stack`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod invoker;

pub use error::{InvokeError, InvokeResult};
pub use invoker::{InvokeRequest, Invoker};

pub use hermes_config as config;
pub use hermes_core as core;
pub use hermes_manifest as manifest;
pub use hermes_router as router;
pub use hermes_telemetry as telemetry;

pub use hermes_config::{ConfigLoader, HermesConfig};
pub use hermes_core::{
    ApiGatewayEvent, Callback, EnvMode, Handler, HandlerRegistry, HandlerResponse, HandlerResult,
    InvocationContext, NormalizedResponse,
};

use hermes_config::{LogFormat, LoggingConfig};
use hermes_telemetry::{LogConfig, TelemetryResult};

/// Installs the global log subscriber described by a `[logging]` section.
///
/// # Errors
///
/// Returns an error if the level does not parse or a subscriber is already
/// installed.
pub fn init_logging(logging: &LoggingConfig) -> TelemetryResult<()> {
    hermes_telemetry::init_logging(&log_config(logging))
}

fn log_config(logging: &LoggingConfig) -> LogConfig {
    LogConfig {
        enabled: logging.enabled,
        level: logging.level.clone(),
        json_format: logging.format == LogFormat::Json,
        ..LogConfig::default()
    }
}

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        ApiGatewayEvent, Callback, Handler, HandlerRegistry, HandlerResponse, HandlerResult,
        InvocationContext, InvokeError, InvokeResult, Invoker, NormalizedResponse,
    };
}
