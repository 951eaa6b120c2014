//! Facade error type.

use std::path::PathBuf;

use hermes_config::ConfigError;
use hermes_core::CoreError;
use hermes_manifest::ManifestError;
use hermes_router::RouterError;
use thiserror::Error;

/// Result type alias using [`InvokeError`].
pub type InvokeResult<T> = Result<T, InvokeError>;

/// Everything that can stop an invocation from producing a response.
///
/// A failing handler is not among them: it yields a `502`
/// [`NormalizedResponse`](hermes_core::NormalizedResponse) instead.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// The manifest could not be found, read or resolved.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A route failed to compile or the request line is malformed.
    #[error(transparent)]
    Router(#[from] RouterError),

    /// No declared http event matches the request.
    #[error(
        "Serverless http event not found for HTTP request \"{request}\" in service path \"{}\".",
        service_path.display()
    )]
    RouteNotFound {
        /// The literal request line.
        request: String,
        /// The service directory that was searched.
        service_path: PathBuf,
    },

    /// The matched function's handler reference has no registered handler.
    #[error("no handler registered for \"{handler}\" (function \"{function}\")")]
    HandlerNotRegistered {
        /// Handler reference from the manifest.
        handler: String,
        /// Declaring function.
        function: String,
    },

    /// Event overrides were not a JSON object.
    #[error("event overrides must be a JSON object or null, got {found}")]
    InvalidEventOverrides {
        /// JSON type that was supplied.
        found: &'static str,
    },

    /// Context was not a JSON object.
    #[error("invocation context must be a JSON object or null, got {found}")]
    InvalidContext {
        /// JSON type that was supplied.
        found: &'static str,
    },

    /// A response declared as JSON carried an unparsable body.
    #[error("handler returned a JSON content type but the body is not valid JSON: {source}")]
    BodyParse {
        /// The raw body text.
        body: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// A request body could not be serialized.
    #[error("failed to serialize request body: {0}")]
    RequestBody(#[source] serde_json::Error),

    /// Harness configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl InvokeError {
    /// Create a route-not-found error for a service directory.
    pub fn route_not_found(request: impl Into<String>, service_path: impl Into<PathBuf>) -> Self {
        Self::RouteNotFound {
            request: request.into(),
            service_path: service_path.into(),
        }
    }

    /// Returns true when no declared route matched.
    #[must_use]
    pub const fn is_route_not_found(&self) -> bool {
        matches!(self, Self::RouteNotFound { .. })
    }
}

impl From<CoreError> for InvokeError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidEventOverrides { found } => Self::InvalidEventOverrides { found },
            CoreError::InvalidContext { found } => Self::InvalidContext { found },
            CoreError::BodyParse { body, source } => Self::BodyParse { body, source },
            CoreError::Router(err) => Self::Router(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_not_found_message() {
        let err = InvokeError::route_not_found("GET api/DOES_NOT_EXIST", "/srv/basic");
        assert_eq!(
            err.to_string(),
            "Serverless http event not found for HTTP request \"GET api/DOES_NOT_EXIST\" \
             in service path \"/srv/basic\"."
        );
        assert!(err.is_route_not_found());
    }

    #[test]
    fn test_core_errors_map_to_named_variants() {
        let err: InvokeError = CoreError::invalid_event_overrides(&json!([1])).into();
        assert!(matches!(err, InvokeError::InvalidEventOverrides { found: "array" }));

        let err: InvokeError = CoreError::invalid_context(&json!("x")).into();
        assert!(matches!(err, InvokeError::InvalidContext { found: "string" }));

        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: InvokeError = CoreError::BodyParse { body: "{oops".into(), source }.into();
        assert!(matches!(err, InvokeError::BodyParse { body, .. } if body == "{oops"));
    }

    #[test]
    fn test_manifest_not_found_passes_through() {
        let err: InvokeError = ManifestError::not_found("/tmp/nowhere").into();
        assert!(err
            .to_string()
            .starts_with("Cannot find serverless.yml. Started search in working directory"));
    }
}
