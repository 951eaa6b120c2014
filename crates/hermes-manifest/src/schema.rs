//! The subset of the manifest schema Hermes reads.
//!
//! Unknown top-level and provider keys (`plugins`, `custom`, `resources`,
//! `iamRoleStatements`, ...) are accepted and ignored.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{ManifestError, ManifestResult};

/// A manifest after variable resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestDocument {
    /// Service name, plain or `{ name: ... }`.
    pub service: ServiceDecl,
    /// Provider block.
    #[serde(default)]
    pub provider: ProviderDecl,
    /// Functions in declaration order.
    #[serde(default)]
    pub functions: IndexMap<String, FunctionDecl>,
}

/// The `service` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServiceDecl {
    /// `service: my-service`
    Name(String),
    /// `service: { name: my-service }`
    Object {
        /// Service name.
        name: String,
    },
}

impl ServiceDecl {
    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Object { name } => name,
        }
    }
}

/// The `provider` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderDecl {
    /// Cloud provider name.
    #[serde(default)]
    pub name: Option<String>,
    /// Runtime identifier.
    #[serde(default)]
    pub runtime: Option<String>,
    /// Deployment stage.
    #[serde(default)]
    pub stage: Option<String>,
    /// Deployment region.
    #[serde(default)]
    pub region: Option<String>,
    /// Environment shared by every function.
    #[serde(default)]
    pub environment: Option<IndexMap<String, Value>>,
}

/// One entry of `functions`.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDecl {
    /// Handler reference, `module.export`.
    pub handler: String,
    /// Deployed function name override.
    #[serde(default)]
    pub name: Option<String>,
    /// Function-level environment, merged over the provider's.
    #[serde(default)]
    pub environment: Option<IndexMap<String, Value>>,
    /// Event triggers; each entry is a single-key map such as `http: ...`.
    #[serde(default)]
    pub events: Option<Vec<Value>>,
}

/// A method and path declared by an `http` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEvent {
    /// Declared method.
    pub method: String,
    /// Declared path template.
    pub path: String,
}

impl HttpEvent {
    /// Interprets one entry of a function's `events` list.
    ///
    /// Returns `None` for non-http events and for `http: null`. Accepts the
    /// object form `{ method, path }` and the shorthand `"GET api/hello"`.
    pub fn from_event(function: &str, event: &Value) -> ManifestResult<Option<Self>> {
        let Some(http) = event.as_object().and_then(|map| map.get("http")) else {
            return Ok(None);
        };

        match http {
            Value::Null => Ok(None),
            Value::String(shorthand) => {
                let (method, path) = shorthand
                    .trim()
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| {
                        ManifestError::invalid_event(
                            function,
                            format!("shorthand \"{shorthand}\" must be \"METHOD path\""),
                        )
                    })?;
                Ok(Some(Self {
                    method: method.to_string(),
                    path: path.trim().to_string(),
                }))
            }
            Value::Object(map) => {
                let field = |name: &str| {
                    map.get(name).and_then(Value::as_str).ok_or_else(|| {
                        ManifestError::invalid_event(function, format!("missing string field \"{name}\""))
                    })
                };
                Ok(Some(Self {
                    method: field("method")?.to_string(),
                    path: field("path")?.to_string(),
                }))
            }
            other => Err(ManifestError::invalid_event(
                function,
                format!("expected an object or a string, got {other}"),
            )),
        }
    }
}

/// Flattens a declared environment into strings.
///
/// Scalars are stringified, `null` entries are dropped, and structured
/// values (typically cloud intrinsic functions such as `{ Ref: ... }`) are
/// dropped with a warning since they cannot be evaluated locally.
#[must_use]
pub fn environment_strings(declared: Option<&IndexMap<String, Value>>) -> IndexMap<String, String> {
    let Some(declared) = declared else {
        return IndexMap::new();
    };

    declared
        .iter()
        .filter_map(|(name, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => return None,
                Value::Array(_) | Value::Object(_) => {
                    warn!(name = %name, "skipping environment value that cannot be evaluated locally");
                    return None;
                }
            };
            Some((name.clone(), text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_object_form() {
        let event = json!({ "http": { "path": "api/hello", "method": "get", "cors": true } });
        let http = HttpEvent::from_event("hello", &event).unwrap().unwrap();
        assert_eq!(http, HttpEvent { method: "get".into(), path: "api/hello".into() });
    }

    #[test]
    fn test_http_shorthand_form() {
        let event = json!({ "http": "GET api/shorthand" });
        let http = HttpEvent::from_event("shorthand", &event).unwrap().unwrap();
        assert_eq!(http.method, "GET");
        assert_eq!(http.path, "api/shorthand");
    }

    #[test]
    fn test_non_http_and_null_events_skipped() {
        assert!(HttpEvent::from_event("f", &json!({ "schedule": "rate(1 minute)" })).unwrap().is_none());
        assert!(HttpEvent::from_event("f", &json!({ "http": null })).unwrap().is_none());
        assert!(HttpEvent::from_event("f", &json!("sqs")).unwrap().is_none());
    }

    #[test]
    fn test_invalid_http_events() {
        assert!(matches!(
            HttpEvent::from_event("f", &json!({ "http": "GET" })),
            Err(ManifestError::InvalidEvent { .. })
        ));
        assert!(matches!(
            HttpEvent::from_event("f", &json!({ "http": { "path": "x" } })),
            Err(ManifestError::InvalidEvent { reason, .. }) if reason.contains("method")
        ));
        assert!(HttpEvent::from_event("f", &json!({ "http": 42 })).is_err());
    }

    #[test]
    fn test_environment_strings() {
        let declared: IndexMap<String, Value> = serde_json::from_value(json!({
            "MY_SIMPLE": "simple value",
            "PORT": 8080,
            "DEBUG": false,
            "UNSET": null,
            "TABLE_ARN": { "Fn::GetAtt": ["Table", "Arn"] },
        }))
        .unwrap();
        let env = environment_strings(Some(&declared));
        assert_eq!(
            env.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect::<Vec<_>>(),
            vec![("MY_SIMPLE", "simple value"), ("PORT", "8080"), ("DEBUG", "false")]
        );
        assert!(environment_strings(None).is_empty());
    }

    #[test]
    fn test_document_shape() {
        let doc: ManifestDocument = serde_json::from_value(json!({
            "service": { "name": "basic" },
            "plugins": ["x"],
            "provider": { "name": "aws", "runtime": "nodejs8.10", "memorySize": 128 },
            "functions": {
                "b": { "handler": "handler.b" },
                "a": { "handler": "handler.a", "events": [{ "http": "GET a" }] },
            },
        }))
        .unwrap();
        assert_eq!(doc.service.name(), "basic");
        assert_eq!(doc.provider.name.as_deref(), Some("aws"));
        assert_eq!(doc.functions.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
