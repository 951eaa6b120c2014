//! Declared route shapes.
//!
//! A [`RouteTemplate`] is what a manifest declares for one HTTP trigger:
//! a method, a path template and the handler it is bound to. Templates are
//! immutable and created once per manifest load.

use std::fmt;

use serde::Serialize;

/// Method token that matches every HTTP method.
pub const ANY_METHOD: &str = "ANY";

/// Reference to a handler, written `module.export` in the manifest.
///
/// The module part may itself contain dots and slashes
/// (`src/handlers/users.list`); the export is everything after the last dot.
///
/// # Example
///
/// ```
/// use hermes_router::HandlerRef;
///
/// let handler = HandlerRef::new("src/handlers/users.list");
/// assert_eq!(handler.module(), "src/handlers/users");
/// assert_eq!(handler.export(), "list");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HandlerRef(String);

impl HandlerRef {
    /// Creates a handler reference from its manifest spelling.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the reference exactly as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the module path part.
    #[must_use]
    pub fn module(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(m, _)| m)
    }

    /// Returns the exported symbol part (empty when the reference has no dot).
    #[must_use]
    pub fn export(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(_, e)| e)
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for HandlerRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A declared HTTP route bound to a handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTemplate {
    /// Name of the declaring function.
    pub function_name: String,
    /// Uppercase HTTP verb, or [`ANY_METHOD`].
    pub method: String,
    /// Path template, e.g. `api/users/{id}`.
    pub path_template: String,
    /// The handler invoked for this route.
    pub handler_ref: HandlerRef,
}

impl RouteTemplate {
    /// Creates a route template. The method is normalized to uppercase.
    #[must_use]
    pub fn new(
        function_name: impl Into<String>,
        method: impl AsRef<str>,
        path_template: impl Into<String>,
        handler_ref: impl Into<HandlerRef>,
    ) -> Self {
        Self {
            function_name: function_name.into(),
            method: method.as_ref().trim().to_uppercase(),
            path_template: path_template.into(),
            handler_ref: handler_ref.into(),
        }
    }

    /// Returns true if this route accepts every method.
    #[must_use]
    pub fn is_any_method(&self) -> bool {
        self.method == ANY_METHOD || self.method == "*"
    }
}

/// One `/`-separated piece of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    /// Literal text, matched verbatim.
    Literal(&'a str),
    /// `{name}`: exactly one path segment.
    Param(&'a str),
    /// `{name+}`: one or more trailing segments.
    Greedy(&'a str),
}

/// Splits a template into segments, ignoring a leading `/`.
///
/// Only a segment that is entirely `{...}` is a placeholder; braces embedded
/// in a larger segment stay literal.
pub(crate) fn segments(template: &str) -> impl Iterator<Item = Segment<'_>> {
    template
        .strip_prefix('/')
        .unwrap_or(template)
        .split('/')
        .map(|segment| {
            match segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
            {
                Some(inner) => match inner.strip_suffix('+') {
                    Some(name) => Segment::Greedy(name),
                    None => Segment::Param(inner),
                },
                None => Segment::Literal(segment),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_ref_parts() {
        let handler = HandlerRef::new("handler.hello");
        assert_eq!(handler.module(), "handler");
        assert_eq!(handler.export(), "hello");
        assert_eq!(handler.to_string(), "handler.hello");
    }

    #[test]
    fn test_handler_ref_nested_module() {
        let handler = HandlerRef::new("./src/api.v1/users.get");
        assert_eq!(handler.module(), "./src/api.v1/users");
        assert_eq!(handler.export(), "get");
    }

    #[test]
    fn test_handler_ref_without_export() {
        let handler = HandlerRef::new("handler");
        assert_eq!(handler.module(), "handler");
        assert_eq!(handler.export(), "");
    }

    #[test]
    fn test_route_template_uppercases_method() {
        let route = RouteTemplate::new("hello", "get", "api/hello", "handler.hello");
        assert_eq!(route.method, "GET");
        assert!(!route.is_any_method());
        assert!(RouteTemplate::new("f", "any", "x", "h.f").is_any_method());
    }

    #[test]
    fn test_segments() {
        let parsed: Vec<_> = segments("/api/{id}/files/{path+}").collect();
        assert_eq!(
            parsed,
            vec![
                Segment::Literal("api"),
                Segment::Param("id"),
                Segment::Literal("files"),
                Segment::Greedy("path"),
            ]
        );
    }

    #[test]
    fn test_segments_embedded_braces_are_literal() {
        let parsed: Vec<_> = segments("api/v{version}").collect();
        assert_eq!(parsed, vec![Segment::Literal("api"), Segment::Literal("v{version}")]);
    }
}
