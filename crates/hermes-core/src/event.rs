//! Gateway event synthesis.
//!
//! An [`ApiGatewayEvent`] is the object a handler receives: the five
//! computed routing fields plus any caller-supplied fields (`body`,
//! `headers`, `requestContext`, ...).

use hermes_router::{Params, RequestLine, RouteMatch};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};

/// Field names computed by the synthesizer.
///
/// A caller override with one of these names is replaced.
pub const COMPUTED_FIELDS: [&str; 5] = [
    "httpMethod",
    "path",
    "resource",
    "pathParameters",
    "queryStringParameters",
];

/// A gateway-style request event.
///
/// Serializes as a single flat JSON object. `pathParameters` and
/// `queryStringParameters` are always present, possibly empty.
///
/// # Example
///
/// ```
/// use hermes_core::ApiGatewayEvent;
/// use hermes_router::{RequestLine, RouteTable, RouteTemplate};
/// use serde_json::json;
///
/// let table = RouteTable::compile([RouteTemplate::new(
///     "pair",
///     "GET",
///     "api/res1/{res1ID}/res2/{res2ID}",
///     "handler.pair",
/// )])
/// .unwrap();
///
/// let raw = "GET api/res1/xxx/res2/yyy?x=1";
/// let matched = table.match_request(raw).unwrap();
/// let line = RequestLine::parse(raw).unwrap();
///
/// let event = ApiGatewayEvent::synthesize(&matched, &line, json!({ "body": "boo" })).unwrap();
/// assert_eq!(event.http_method, "GET");
/// assert_eq!(event.path, "/api/res1/xxx/res2/yyy");
/// assert_eq!(event.path_parameters.get("res2ID"), Some("yyy"));
/// assert_eq!(event.query_string_parameters.get("x"), Some("1"));
/// assert_eq!(event.body(), Some("boo"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayEvent {
    /// The method token of the request line, verbatim.
    pub http_method: String,
    /// Percent-decoded request path, leading `/`, no query.
    pub path: String,
    /// Same as `path`.
    pub resource: String,
    /// Captured path parameters.
    pub path_parameters: Params,
    /// Decoded query parameters.
    pub query_string_parameters: Params,
    /// Caller-supplied fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiGatewayEvent {
    /// Builds the event for a matched request.
    ///
    /// `overrides` must be a JSON object or `null`. Its fields are kept,
    /// except that the computed fields always win.
    pub fn synthesize(
        matched: &RouteMatch<'_>,
        request: &RequestLine<'_>,
        overrides: Value,
    ) -> CoreResult<Self> {
        let mut extra = match overrides {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => return Err(CoreError::invalid_event_overrides(&other)),
        };
        for field in COMPUTED_FIELDS {
            extra.remove(field);
        }

        let path = request.path();
        Ok(Self {
            http_method: request.method().to_string(),
            resource: path.clone(),
            path,
            path_parameters: matched.path_params.clone(),
            query_string_parameters: request.query()?,
            extra,
        })
    }

    /// Returns a caller-supplied field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Returns the caller-supplied `body` when it is a string.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.field("body").and_then(Value::as_str)
    }

    /// Looks up a caller-supplied header, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.field("headers")
            .and_then(Value::as_object)?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.as_str())
    }

    /// Renders the event as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_router::{RouteTable, RouteTemplate};
    use serde_json::json;

    fn table() -> RouteTable {
        RouteTable::compile([
            RouteTemplate::new("hello", "GET", "api/hello", "handler.hello"),
            RouteTemplate::new("greedy", "GET", "api/greedy/{money+}", "handler.greedy"),
            RouteTemplate::new("postit", "POST", "api/postit", "handler.postit"),
        ])
        .unwrap()
    }

    fn synth(raw: &str, overrides: Value) -> CoreResult<ApiGatewayEvent> {
        let table = table();
        let matched = table.match_request(raw).unwrap();
        let line = RequestLine::parse(raw).unwrap();
        ApiGatewayEvent::synthesize(&matched, &line, overrides)
    }

    #[test]
    fn test_synthesize_minimal_event() {
        let event = synth("GET api/hello", Value::Null).unwrap();
        assert_eq!(
            event.to_value(),
            json!({
                "httpMethod": "GET",
                "path": "/api/hello",
                "resource": "/api/hello",
                "pathParameters": {},
                "queryStringParameters": {},
            })
        );
    }

    #[test]
    fn test_method_kept_verbatim() {
        let event = synth("get api/hello", Value::Null).unwrap();
        assert_eq!(event.http_method, "get");
    }

    #[test]
    fn test_greedy_param_in_event() {
        let event = synth("GET api/greedy/blah/blah/blah", Value::Null).unwrap();
        assert_eq!(event.path, "/api/greedy/blah/blah/blah");
        assert_eq!(event.path_parameters.get("money"), Some("blah/blah/blah"));
    }

    #[test]
    fn test_overrides_are_passed_through() {
        let event = synth(
            "POST api/postit",
            json!({ "body": "boo", "headers": { "X-Trace": "abc" } }),
        )
        .unwrap();
        assert_eq!(event.body(), Some("boo"));
        assert_eq!(event.header("x-trace"), Some("abc"));
        assert_eq!(event.to_value()["body"], "boo");
    }

    #[test]
    fn test_computed_fields_win() {
        let event = synth(
            "GET api/hello?a=1",
            json!({ "path": "/spoofed", "httpMethod": "DELETE", "queryStringParameters": { "b": "2" } }),
        )
        .unwrap();
        assert_eq!(event.path, "/api/hello");
        assert_eq!(event.http_method, "GET");
        assert_eq!(event.query_string_parameters.get("a"), Some("1"));
        assert!(event.query_string_parameters.get("b").is_none());
        assert!(event.field("path").is_none());

        let value = event.to_value();
        assert_eq!(value["path"], "/api/hello");
    }

    #[test]
    fn test_non_object_overrides_rejected() {
        let err = synth("GET api/hello", json!("body")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidEventOverrides { found: "string" }));
    }

    #[test]
    fn test_event_deserializes_with_extra_fields() {
        let event: ApiGatewayEvent = serde_json::from_value(json!({
            "httpMethod": "GET",
            "path": "/x",
            "resource": "/x",
            "pathParameters": {},
            "queryStringParameters": { "q": "1" },
            "stageVariables": { "s": "v" },
        }))
        .unwrap();
        assert_eq!(event.query_string_parameters.get("q"), Some("1"));
        assert_eq!(event.field("stageVariables"), Some(&json!({ "s": "v" })));
    }
}
