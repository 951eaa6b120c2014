//! Router error types.

use thiserror::Error;

/// Result type for routing operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Errors that can occur while compiling or matching routes.
#[derive(Error, Debug)]
pub enum RouterError {
    /// A placeholder with no name (`{}` or `{+}`) was found in a template.
    #[error("empty path parameter name in template \"{template}\"")]
    EmptyParamName {
        /// The offending path template.
        template: String,
    },

    /// The same placeholder name appears twice in one template.
    #[error("duplicate path parameter \"{name}\" in template \"{template}\"")]
    DuplicateParam {
        /// The repeated parameter name.
        name: String,
        /// The offending path template.
        template: String,
    },

    /// The synthesized pattern was rejected by the regex engine.
    #[error("invalid route pattern for {method} {template}: {source}")]
    InvalidPattern {
        /// Declared method.
        method: String,
        /// Declared path template.
        template: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// No declared route matches the request line.
    #[error("no route matches HTTP request \"{request}\"")]
    RouteNotFound {
        /// The literal request line.
        request: String,
    },

    /// A route's capture groups disagree with its parameter names.
    ///
    /// This indicates a compiler defect, never a user error.
    #[error(
        "expected param names and param values to have same length for {template}: \
         names {names:?} != values {values:?}"
    )]
    ParamCountMismatch {
        /// The path template of the matched route.
        template: String,
        /// Declared parameter names.
        names: Vec<String>,
        /// Captured parameter values.
        values: Vec<String>,
    },

    /// The request line is not of the form `METHOD path[?query]`.
    #[error("malformed request line \"{request}\": {reason}")]
    MalformedRequest {
        /// The literal request line.
        request: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The query string could not be decoded.
    #[error("invalid query string in \"{request}\": {reason}")]
    InvalidQuery {
        /// The literal request line.
        request: String,
        /// Decoder message.
        reason: String,
    },
}

impl RouterError {
    /// Create a new route-not-found error.
    pub fn route_not_found(request: impl Into<String>) -> Self {
        Self::RouteNotFound {
            request: request.into(),
        }
    }

    /// Create a new malformed request error.
    pub fn malformed_request(request: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRequest {
            request: request.into(),
            reason: reason.into(),
        }
    }
}
