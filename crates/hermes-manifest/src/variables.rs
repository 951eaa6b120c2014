//! Manifest variable resolution.
//!
//! Supports the variable sources a local invocation can answer:
//!
//! | Expression | Value |
//! |---|---|
//! | `${env:NAME}` | process environment (snapshot) |
//! | `${self:dotted.path}` | another value of the same manifest |
//! | `${opt:stage}`, `${opt:region}` | harness options |
//!
//! A reference may carry fallbacks after a comma: a quoted literal
//! (`${opt:stage, 'dev'}`), a number, or another reference
//! (`${opt:stage, self:provider.stage}`). Fallbacks may nest
//! (`${opt:stage, ${self:provider.stage}}`).
//!
//! Other sources (`file`, `ssm`, `cf`, ...) cannot be answered locally: they
//! take their fallback when one is given and are otherwise left verbatim.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ManifestError, ManifestResult};

const OPEN: &str = "${";

/// Values available to variable resolution.
///
/// # Example
///
/// ```
/// use hermes_manifest::VariableSources;
///
/// let sources = VariableSources::new()
///     .with_option("stage", "test")
///     .with_env_var("TABLE", "orders");
/// assert_eq!(sources.option("stage"), Some("test"));
/// assert_eq!(sources.env_var("TABLE"), Some("orders"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct VariableSources {
    options: IndexMap<String, String>,
    env: HashMap<String, String>,
}

impl VariableSources {
    /// Creates empty sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates sources holding a snapshot of the process environment.
    #[must_use]
    pub fn from_process_env() -> Self {
        Self {
            options: IndexMap::new(),
            env: std::env::vars().collect(),
        }
    }

    /// Sets an `${opt:...}` value.
    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Sets an `${env:...}` value.
    #[must_use]
    pub fn with_env_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Adds `${env:...}` values that are not already set.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_manifest::VariableSources;
    ///
    /// let sources = VariableSources::new()
    ///     .with_env_var("TABLE", "orders")
    ///     .with_env_defaults([
    ///         ("TABLE".to_string(), "ignored".to_string()),
    ///         ("HOME".to_string(), "/root".to_string()),
    ///     ]);
    /// assert_eq!(sources.env_var("TABLE"), Some("orders"));
    /// assert_eq!(sources.env_var("HOME"), Some("/root"));
    /// ```
    #[must_use]
    pub fn with_env_defaults(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        for (name, value) in vars {
            self.env.entry(name).or_insert(value);
        }
        self
    }

    /// Returns an option value.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Returns an environment value.
    #[must_use]
    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }
}

/// Resolves every variable in a manifest document.
///
/// # Example
///
/// ```
/// use hermes_manifest::{resolve_variables, VariableSources};
/// use serde_json::json;
///
/// let doc = json!({
///     "service": "orders",
///     "provider": { "stage": "${opt:stage, 'dev'}" },
///     "custom": { "table": "${self:service}-${self:provider.stage}" },
/// });
///
/// let resolved = resolve_variables(&doc, &VariableSources::new()).unwrap();
/// assert_eq!(resolved["custom"]["table"], "orders-dev");
/// ```
pub fn resolve_variables(document: &Value, sources: &VariableSources) -> ManifestResult<Value> {
    Resolver {
        root: document,
        sources,
        stack: Vec::new(),
    }
    .resolve_value(document, "")
}

/// Result of looking up one reference.
enum Lookup {
    Found(Value),
    Missing,
    Unsupported,
}

struct Resolver<'a> {
    root: &'a Value,
    sources: &'a VariableSources,
    stack: Vec<String>,
}

impl Resolver<'_> {
    fn resolve_value(&mut self, value: &Value, location: &str) -> ManifestResult<Value> {
        match value {
            Value::String(text) => self.resolve_string(text, location),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.resolve_value(item, &format!("{location}[{i}]")))
                .collect::<ManifestResult<Vec<_>>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut resolved = Map::with_capacity(map.len());
                for (key, item) in map {
                    let child = join_location(location, key);
                    resolved.insert(key.clone(), self.resolve_value(item, &child)?);
                }
                Ok(Value::Object(resolved))
            }
            other => Ok(other.clone()),
        }
    }

    fn resolve_string(&mut self, text: &str, location: &str) -> ManifestResult<Value> {
        let Some(first) = text.find(OPEN) else {
            return Ok(Value::String(text.to_string()));
        };

        // A string that is exactly one variable takes the referenced value as is.
        if first == 0 {
            if let Some(end) = closing_brace(text, 0) {
                if end == text.len() - 1 {
                    return self.resolve_expression(text, &text[2..end], location);
                }
            }
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let Some(end) = closing_brace(rest, start) else {
                out.push_str(&rest[start..]);
                return Ok(Value::String(out));
            };
            let variable = &rest[start..=end];
            let value = self.resolve_expression(variable, &rest[start + 2..end], location)?;
            out.push_str(&stringify(&value));
            rest = &rest[end + 1..];
        }
        out.push_str(rest);
        Ok(Value::String(out))
    }

    /// Resolves `reference[, fallback]*`, the text between `${` and `}`.
    fn resolve_expression(
        &mut self,
        variable: &str,
        expression: &str,
        location: &str,
    ) -> ManifestResult<Value> {
        let mut unsupported = false;

        for candidate in split_top_level(expression) {
            let candidate = candidate.trim();
            if candidate.is_empty() {
                continue;
            }
            if let Some(literal) = quoted_literal(candidate) {
                return Ok(Value::String(literal.to_string()));
            }
            if let Ok(number) = candidate.parse::<serde_json::Number>() {
                return Ok(Value::Number(number));
            }

            if candidate.starts_with(OPEN) {
                match self.resolve_string(candidate, location)? {
                    Value::String(s) if s.starts_with(OPEN) => {
                        unsupported = true;
                        continue;
                    }
                    value => return Ok(value),
                }
            }

            match self.lookup(candidate)? {
                Lookup::Found(value) => return Ok(value),
                Lookup::Missing => {}
                Lookup::Unsupported => unsupported = true,
            }
        }

        if unsupported {
            warn!(
                variable = variable,
                location = location,
                "variable source is not supported locally, leaving it unresolved"
            );
            return Ok(Value::String(variable.to_string()));
        }
        Err(ManifestError::unresolved(variable, display_location(location)))
    }

    fn lookup(&mut self, reference: &str) -> ManifestResult<Lookup> {
        let Some((source, address)) = reference.split_once(':') else {
            return Ok(Lookup::Unsupported);
        };
        let address = address.trim();

        match source.trim() {
            "env" => Ok(self
                .sources
                .env_var(address)
                .map_or(Lookup::Missing, |v| Lookup::Found(Value::String(v.to_string())))),
            "opt" => Ok(self
                .sources
                .option(address)
                .map_or(Lookup::Missing, |v| Lookup::Found(Value::String(v.to_string())))),
            "self" => self.lookup_self(address),
            _ => Ok(Lookup::Unsupported),
        }
    }

    fn lookup_self(&mut self, address: &str) -> ManifestResult<Lookup> {
        if self.stack.iter().any(|entry| entry == address) {
            let mut chain = self.stack.clone();
            chain.push(address.to_string());
            return Err(ManifestError::VariableCycle { chain });
        }

        let Some(target) = walk(self.root, address) else {
            return Ok(Lookup::Missing);
        };
        if target.is_null() {
            return Ok(Lookup::Missing);
        }

        self.stack.push(address.to_string());
        let resolved = self.resolve_value(target, address);
        self.stack.pop();
        resolved.map(Lookup::Found)
    }
}

/// Follows a dotted path through objects and arrays. An empty path is the root.
fn walk<'v>(root: &'v Value, address: &str) -> Option<&'v Value> {
    if address.is_empty() {
        return Some(root);
    }
    address.split('.').try_fold(root, |node, key| match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Index of the `}` closing the `${` at `start`, honoring nesting.
fn closing_brace(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits on commas outside nested `${...}` and quotes.
fn split_top_level(expression: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut last = 0;

    for (i, c) in expression.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&expression[last..i]);
                last = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&expression[last..]);
    parts
}

fn quoted_literal(candidate: &str) -> Option<&str> {
    ['\'', '"'].iter().find_map(|q| {
        candidate
            .strip_prefix(*q)
            .and_then(|s| s.strip_suffix(*q))
    })
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn join_location(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn display_location(location: &str) -> String {
    if location.is_empty() {
        "<root>".to_string()
    } else {
        location.to_string()
    }
}
