//! Handler results and normalized responses.

use http::header::CONTENT_TYPE;
use http::StatusCode;
use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{CoreError, CoreResult, HandlerFailure};

/// Media type that triggers body parsing.
const JSON_MEDIA_TYPE: &str = "application/json";

/// Message of every handler-failure response.
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal server error";

/// What a handler returns on success.
///
/// # Example
///
/// ```
/// use hermes_core::HandlerResponse;
/// use serde_json::json;
///
/// let response = HandlerResponse::ok().json(&json!({ "message": "hello" })).unwrap();
/// assert_eq!(response.status_code, 200);
/// assert_eq!(response.body.as_deref(), Some(r#"{"message":"hello"}"#));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, String>>,
    /// Raw body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl HandlerResponse {
    /// Creates a response with a status code and nothing else.
    #[must_use]
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: None,
            body: None,
        }
    }

    /// Creates a `200` response.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::OK.as_u16())
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Sets a raw text body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes a value as the body and marks it as JSON.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_string(value)?;
        Ok(self.header("Content-Type", JSON_MEDIA_TYPE).body(body))
    }
}

/// The uniform result of an invocation.
///
/// On success it mirrors the handler's response, with a JSON body already
/// parsed. On handler failure it is a `502` whose body describes the error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers, as returned by the handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, String>>,
    /// Parsed JSON, the raw string, or `null` when there was no body.
    pub body: Value,
}

impl NormalizedResponse {
    /// Normalizes a successful handler response.
    ///
    /// A non-empty body is parsed when the `Content-Type` header (any case)
    /// names `application/json`, ignoring media-type parameters.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_core::{HandlerResponse, NormalizedResponse};
    /// use serde_json::json;
    ///
    /// let raw = HandlerResponse::ok()
    ///     .header("content-type", "application/json; charset=utf-8")
    ///     .body(r#"{"message":"postit:boo"}"#);
    ///
    /// let normalized = NormalizedResponse::from_handler(raw).unwrap();
    /// assert_eq!(normalized.body, json!({ "message": "postit:boo" }));
    /// ```
    pub fn from_handler(response: HandlerResponse) -> CoreResult<Self> {
        let is_json = response
            .headers
            .as_ref()
            .is_some_and(|headers| declares_json(headers));

        let body = match response.body {
            None => Value::Null,
            Some(text) if is_json && !text.is_empty() => serde_json::from_str(&text)
                .map_err(|source| CoreError::BodyParse { body: text, source })?,
            Some(text) => Value::String(text),
        };

        Ok(Self {
            status_code: response.status_code,
            headers: response.headers,
            body,
        })
    }

    /// Builds the `502` response for a handler failure.
    #[must_use]
    pub fn bad_gateway(failure: &HandlerFailure) -> Self {
        Self {
            status_code: StatusCode::BAD_GATEWAY.as_u16(),
            headers: None,
            body: json!({
                "message": INTERNAL_SERVER_ERROR_MESSAGE,
                "debug_error_message": failure.message,
                "debug_error_stack": failure.stack,
            }),
        }
    }

    /// Returns the status as an [`http::StatusCode`], if it is valid.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status_code).ok()
    }

    /// Returns true for 2xx status codes.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Looks up a response header, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the body when it stayed a plain string.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.body.as_str()
    }

    /// Deserializes the body into a typed value.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}

fn declares_json(headers: &IndexMap<String, String>) -> bool {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()))
        .is_some_and(|(_, value)| {
            value
                .split(';')
                .next()
                .is_some_and(|media| media.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
        })
}
