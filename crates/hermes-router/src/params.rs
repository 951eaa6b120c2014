//! Extracted parameter maps.
//!
//! Both path and query parameters are ordered string maps: iteration order
//! is the order in which the values appeared in the request.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered name → value map of request parameters.
///
/// Serializes as a plain JSON object and is never "absent": a route without
/// placeholders, or a request without a query string, yields an empty map.
///
/// # Example
///
/// ```rust
/// use hermes_router::Params;
///
/// let mut params = Params::new();
/// params.insert("res1ID", "xxx");
/// params.insert("res2ID", "yyy");
///
/// assert_eq!(params.get("res1ID"), Some("xxx"));
/// assert_eq!(params.get("unknown"), None);
/// assert_eq!(params.keys().collect::<Vec<_>>(), vec!["res1ID", "res2ID"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    inner: IndexMap<String, String>,
}

impl Params {
    /// Creates an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter.
    ///
    /// An existing name keeps its position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(name.into(), value.into());
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    /// Returns true if the parameter is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over parameter names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Consumes the map, returning the underlying ordered map.
    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, String> {
        self.inner
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Params {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }
}
