//! Path template compilation.
//!
//! Turns a declared `(method, path template)` pair into a regular expression
//! over request lines plus the ordered list of parameter names it captures.
//!
//! # Pattern Shape
//!
//! ```text
//! GET api/res1/{a}/res2/{b}
//!   → ^(?i:GET)\s+/?api/res1/([^/\?]+)/res2/([^/\?]+)(?:\?.*)?$
//!   → param_names = ["a", "b"]
//! ```
//!
//! - `{name}` captures one segment: `([^/\?]+)`
//! - `{name+}` captures the remaining segments, `/` included: `([^\?]+)`
//! - the method is case-insensitive, the path is not
//! - a trailing `?query` is always accepted and never captured

use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::{RouterError, RouterResult};
use crate::template::{segments, RouteTemplate, Segment};

/// Capture group for a single-segment placeholder.
const SEGMENT_CAPTURE: &str = r"([^/\?]+)";

/// Capture group for a greedy placeholder.
const GREEDY_CAPTURE: &str = r"([^\?]+)";

/// Tail accepting an optional query string.
const OPTIONAL_QUERY: &str = r"(?:\?.*)?$";

/// Method pattern used for `ANY` routes.
const ANY_METHOD_PATTERN: &str = "[A-Za-z]+";

/// A route template compiled for matching.
///
/// Compiled routes are plain values: the pattern, the parameter names and
/// the template they came from. Matching is done by free functions in
/// [`crate::matcher`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRoute {
    /// The declared route.
    pub template: RouteTemplate,
    /// Pattern over full request lines.
    #[serde(serialize_with = "serialize_pattern")]
    pub match_pattern: Regex,
    /// Parameter names in capture-group order.
    pub param_names: Vec<String>,
}

impl CompiledRoute {
    /// Compiles a declared route.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_router::{CompiledRoute, RouteTemplate};
    ///
    /// let route = CompiledRoute::compile(RouteTemplate::new(
    ///     "getUser",
    ///     "GET",
    ///     "api/users/{id}",
    ///     "handler.getUser",
    /// ))
    /// .unwrap();
    ///
    /// assert_eq!(route.param_names, vec!["id"]);
    /// assert!(route.is_match("get api/users/42"));
    /// assert!(!route.is_match("GET api/users/42/extra"));
    /// ```
    pub fn compile(template: RouteTemplate) -> RouterResult<Self> {
        let method_pattern = if template.is_any_method() {
            ANY_METHOD_PATTERN.to_string()
        } else {
            regex::escape(&template.method)
        };
        let (path_pattern, param_names) = compile_path(&template.path_template)?;

        let source = format!("^(?i:{method_pattern})\\s+/?{path_pattern}{OPTIONAL_QUERY}");
        let match_pattern = Regex::new(&source).map_err(|source| RouterError::InvalidPattern {
            method: template.method.clone(),
            template: template.path_template.clone(),
            source,
        })?;

        debug!(
            method = %template.method,
            path = %template.path_template,
            pattern = %match_pattern.as_str(),
            params = ?param_names,
            "compiled route"
        );

        Ok(Self {
            template,
            match_pattern,
            param_names,
        })
    }

    /// Returns true if the request line matches this route.
    #[must_use]
    pub fn is_match(&self, request_line: &str) -> bool {
        self.match_pattern.is_match(request_line)
    }

    /// Number of capturing groups in the pattern.
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.match_pattern.captures_len() - 1
    }
}

/// Compiles a path template into a pattern fragment and its parameter names.
///
/// Pure function: the same template always produces the same output.
///
/// # Example
///
/// ```
/// use hermes_router::compile_path;
///
/// let (pattern, names) = compile_path("/greedy/{money+}").unwrap();
/// assert_eq!(pattern, r"greedy/([^\?]+)");
/// assert_eq!(names, vec!["money"]);
/// ```
pub fn compile_path(template: &str) -> RouterResult<(String, Vec<String>)> {
    let mut parts = Vec::new();
    let mut param_names: Vec<String> = Vec::new();

    for segment in segments(template) {
        let (name, capture) = match segment {
            Segment::Literal(text) => {
                parts.push(escape_literal(text));
                continue;
            }
            Segment::Param(name) => (name, SEGMENT_CAPTURE),
            Segment::Greedy(name) => (name, GREEDY_CAPTURE),
        };

        if name.is_empty() {
            return Err(RouterError::EmptyParamName {
                template: template.to_string(),
            });
        }
        if param_names.iter().any(|existing| existing == name) {
            return Err(RouterError::DuplicateParam {
                name: name.to_string(),
                template: template.to_string(),
            });
        }

        param_names.push(name.to_string());
        parts.push(capture.to_string());
    }

    Ok((parts.join("/"), param_names))
}

/// Escapes regex metacharacters in a literal segment.
fn escape_literal(text: &str) -> String {
    regex::escape(text)
}

fn serialize_pattern<S: Serializer>(pattern: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(pattern.as_str())
}
