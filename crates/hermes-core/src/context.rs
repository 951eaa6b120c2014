//! Invocation context types.
//!
//! The [`InvocationContext`] is the second argument of every handler. It
//! carries the request id, the identity of the invoked function and the
//! declared environment, so handlers can read their configuration without
//! touching the process environment.

use hermes_router::HandlerRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// A unique identifier for each invocation, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps ids from one test run sortable in
/// logs.
///
/// # Example
///
/// ```
/// use hermes_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-invocation context handed to the handler.
///
/// # Example
///
/// ```
/// use hermes_core::InvocationContext;
/// use indexmap::IndexMap;
/// use serde_json::json;
///
/// let mut env = IndexMap::new();
/// env.insert("MY_SIMPLE".to_string(), "simple value".to_string());
///
/// let ctx = InvocationContext::new("env", "handler.env")
///     .with_environment(env)
///     .with_client_context(json!({ "user": "alice" }))
///     .unwrap();
///
/// assert_eq!(ctx.env("MY_SIMPLE"), Some("simple value"));
/// assert_eq!(ctx.client_context()["user"], "alice");
/// assert_eq!(ctx.handler_ref().export(), "env");
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    request_id: RequestId,
    function_name: String,
    handler_ref: HandlerRef,
    environment: IndexMap<String, String>,
    client_context: Map<String, Value>,
}

impl InvocationContext {
    /// Creates a context with a fresh request id and no environment.
    #[must_use]
    pub fn new(function_name: impl Into<String>, handler_ref: impl Into<HandlerRef>) -> Self {
        Self {
            request_id: RequestId::new(),
            function_name: function_name.into(),
            handler_ref: handler_ref.into(),
            environment: IndexMap::new(),
            client_context: Map::new(),
        }
    }

    /// Sets the declared environment.
    #[must_use]
    pub fn with_environment(mut self, environment: IndexMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    /// Sets caller-supplied context fields. Accepts an object or `null`.
    pub fn with_client_context(mut self, context: Value) -> CoreResult<Self> {
        self.client_context = match context {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => return Err(CoreError::invalid_context(&other)),
        };
        Ok(self)
    }

    /// Replaces the request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the name of the invoked function.
    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Returns the handler reference.
    #[must_use]
    pub const fn handler_ref(&self) -> &HandlerRef {
        &self.handler_ref
    }

    /// Returns the declared environment.
    #[must_use]
    pub const fn environment(&self) -> &IndexMap<String, String> {
        &self.environment
    }

    /// Returns one declared environment variable.
    #[must_use]
    pub fn env(&self, name: &str) -> Option<&str> {
        self.environment.get(name).map(String::as_str)
    }

    /// Returns the caller-supplied context fields.
    #[must_use]
    pub const fn client_context(&self) -> &Map<String, Value> {
        &self.client_context
    }
}
