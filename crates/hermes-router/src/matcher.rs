//! Request-line matching against a compiled route table.
//!
//! Matching is a linear scan in declaration order and the first matching
//! route wins: when two templates accept the same request, the one declared
//! first in the manifest is authoritative.

use serde::Serialize;
use tracing::debug;

use crate::compiler::CompiledRoute;
use crate::error::{RouterError, RouterResult};
use crate::params::Params;
use crate::template::RouteTemplate;

/// A matched route with its extracted path parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMatch<'a> {
    /// The selected route.
    pub route: &'a CompiledRoute,
    /// Parameter name → captured text, in template order.
    pub path_params: Params,
}

/// Returns the first route whose pattern accepts the request line.
#[must_use]
pub fn find_route<'a>(routes: &'a [CompiledRoute], request_line: &str) -> Option<&'a CompiledRoute> {
    routes.iter().find(|route| route.is_match(request_line))
}

/// Matches a request line against routes in declaration order.
///
/// # Errors
///
/// - [`RouterError::RouteNotFound`] when no route accepts the request line
/// - [`RouterError::ParamCountMismatch`] when the matched route's captures
///   disagree with its parameter names
pub fn match_route<'a>(
    routes: &'a [CompiledRoute],
    request_line: &str,
) -> RouterResult<RouteMatch<'a>> {
    let route = find_route(routes, request_line)
        .ok_or_else(|| RouterError::route_not_found(request_line))?;
    let path_params = extract_params(route, request_line)?;

    debug!(
        request = request_line,
        function = %route.template.function_name,
        path = %route.template.path_template,
        params = path_params.len(),
        "route matched"
    );

    Ok(RouteMatch { route, path_params })
}

/// Re-runs a route's pattern and zips capture groups 1..N with its names.
pub fn extract_params(route: &CompiledRoute, request_line: &str) -> RouterResult<Params> {
    let values: Vec<String> = route
        .match_pattern
        .captures(request_line)
        .map(|caps| {
            caps.iter()
                .skip(1)
                .map_while(|group| group.map(|m| m.as_str().to_string()))
                .collect()
        })
        .unwrap_or_default();

    if values.len() != route.param_names.len() {
        return Err(RouterError::ParamCountMismatch {
            template: route.template.path_template.clone(),
            names: route.param_names.clone(),
            values,
        });
    }

    Ok(route.param_names.iter().cloned().zip(values).collect())
}

/// An ordered table of compiled routes.
///
/// # Example
///
/// ```
/// use hermes_router::{RouteTable, RouteTemplate};
///
/// let table = RouteTable::compile([
///     RouteTemplate::new("hello", "GET", "api/hello", "handler.hello"),
///     RouteTemplate::new("pair", "GET", "api/res1/{res1ID}/res2/{res2ID}", "handler.pair"),
/// ])
/// .unwrap();
///
/// let m = table.match_request("GET api/res1/xxx/res2/yyy").unwrap();
/// assert_eq!(m.route.template.function_name, "pair");
/// assert_eq!(m.path_params.get("res1ID"), Some("xxx"));
/// assert_eq!(m.path_params.get("res2ID"), Some("yyy"));
///
/// assert!(table.match_request("GET api/nope").is_err());
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles every template, keeping declaration order.
    pub fn compile<I>(templates: I) -> RouterResult<Self>
    where
        I: IntoIterator<Item = RouteTemplate>,
    {
        let routes = templates
            .into_iter()
            .map(CompiledRoute::compile)
            .collect::<RouterResult<Vec<_>>>()?;

        debug!(routes = routes.len(), "route table compiled");

        Ok(Self { routes })
    }

    /// Appends a compiled route after all existing ones.
    pub fn push(&mut self, route: CompiledRoute) {
        self.routes.push(route);
    }

    /// Matches a request line; see [`match_route`].
    pub fn match_request(&self, request_line: &str) -> RouterResult<RouteMatch<'_>> {
        match_route(&self.routes, request_line)
    }

    /// Returns true if some route accepts the request line.
    #[must_use]
    pub fn has_route(&self, request_line: &str) -> bool {
        find_route(&self.routes, request_line).is_some()
    }

    /// The compiled routes in declaration order.
    #[must_use]
    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
