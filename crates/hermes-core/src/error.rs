//! Error types for event synthesis and invocation.
//!
//! Only [`HandlerFailure`] ever becomes a response value (a 502). Every
//! [`CoreError`] is a setup or post-processing failure and is returned to
//! the caller.

use std::any::Any;

use hermes_router::RouterError;
use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while preparing an invocation or normalizing its result.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Caller-supplied event overrides were not a JSON object.
    #[error("event overrides must be a JSON object or null, got {found}")]
    InvalidEventOverrides {
        /// JSON type that was supplied.
        found: &'static str,
    },

    /// Caller-supplied context was not a JSON object.
    #[error("invocation context must be a JSON object or null, got {found}")]
    InvalidContext {
        /// JSON type that was supplied.
        found: &'static str,
    },

    /// A response declared as JSON carried a body that does not parse.
    #[error("handler returned a JSON content type but the body is not valid JSON: {source}")]
    BodyParse {
        /// The raw body text.
        body: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The request line could not be decomposed.
    #[error(transparent)]
    Router(#[from] RouterError),
}

impl CoreError {
    /// Create an invalid-overrides error for the given value.
    pub fn invalid_event_overrides(value: &serde_json::Value) -> Self {
        Self::InvalidEventOverrides {
            found: json_type_name(value),
        }
    }

    /// Create an invalid-context error for the given value.
    pub fn invalid_context(value: &serde_json::Value) -> Self {
        Self::InvalidContext {
            found: json_type_name(value),
        }
    }
}

/// Names the JSON type of a value for error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// A handler signalled failure.
///
/// Produced when a handler returns an error, completes its callback with an
/// error, panics, or drops its callback without completing it. The message
/// and stack are surfaced in the 502 response body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerFailure {
    /// Short description of the failure.
    pub message: String,
    /// Diagnostic trace: the error chain, or the panic message.
    pub stack: String,
}

impl HandlerFailure {
    /// Creates a failure from its parts.
    #[must_use]
    pub fn new(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
        }
    }

    /// Creates a failure from a handler error.
    ///
    /// The stack renders the full cause chain (and a backtrace when one was
    /// captured).
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self {
            message: err.to_string(),
            stack: format!("{err:?}"),
        }
    }

    /// Creates a failure from a caught panic payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "handler panicked".to_string());
        Self {
            stack: format!("panicked: {message}"),
            message,
        }
    }

    /// Failure used when a callback-style handler never completes.
    #[must_use]
    pub fn callback_dropped() -> Self {
        let message = "handler dropped its callback without completing it";
        Self::new(message, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_failure_from_error_keeps_chain() {
        let err = Err::<(), _>(anyhow::anyhow!("disk full"))
            .context("saving order")
            .unwrap_err();
        let failure = HandlerFailure::from_error(&err);
        assert_eq!(failure.message, "saving order");
        assert!(failure.stack.contains("disk full"));
    }

    #[test]
    fn test_failure_from_panic_payloads() {
        let static_str: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(HandlerFailure::from_panic(static_str.as_ref()).message, "boom");

        let owned: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        let failure = HandlerFailure::from_panic(owned.as_ref());
        assert_eq!(failure.message, "kaboom");
        assert_eq!(failure.stack, "panicked: kaboom");

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(HandlerFailure::from_panic(other.as_ref()).message, "handler panicked");
    }

    #[test]
    fn test_invalid_overrides_names_type() {
        let err = CoreError::invalid_event_overrides(&serde_json::json!([1, 2]));
        assert!(err.to_string().contains("got array"));
        let err = CoreError::invalid_context(&serde_json::json!("x"));
        assert!(err.to_string().contains("got string"));
    }
}
