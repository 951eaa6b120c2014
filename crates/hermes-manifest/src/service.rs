//! Loading a service from its manifest.

use std::path::{Path, PathBuf};

use hermes_router::{HandlerRef, RouteTemplate};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};

use crate::discover::{manifest_file_in, DEFAULT_MANIFEST_NAMES};
use crate::error::{ManifestError, ManifestResult};
use crate::schema::{environment_strings, HttpEvent, ManifestDocument};
use crate::variables::{resolve_variables, VariableSources};

/// Options controlling how a manifest is located and resolved.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// File names tried in the service directory, in order.
    pub manifest_names: Vec<String>,
    /// Values for variable resolution.
    pub sources: VariableSources,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            manifest_names: DEFAULT_MANIFEST_NAMES.iter().map(ToString::to_string).collect(),
            sources: VariableSources::from_process_env(),
        }
    }
}

/// One declared function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    /// Key under `functions`.
    pub name: String,
    /// Handler reference.
    pub handler: HandlerRef,
    /// Function-level environment.
    pub environment: IndexMap<String, String>,
    /// Declared http events, in order.
    pub http_events: Vec<HttpEvent>,
}

/// A loaded service: its functions, routes and environment.
///
/// # Example
///
/// ```
/// use hermes_manifest::{LoadOptions, Service};
///
/// let yaml = r#"
/// service: basic
/// provider:
///   name: aws
///   environment:
///     MY_SIMPLE: simple value
/// functions:
///   hello:
///     handler: handler.hello
///     events:
///       - http:
///           path: api/hello
///           method: get
///   shorthand:
///     handler: handler.hello
///     events:
///       - http: GET api/shorthand
/// "#;
///
/// let service = Service::from_yaml(yaml, "/srv/basic", &LoadOptions::default()).unwrap();
/// let routes = service.routes();
/// assert_eq!(routes.len(), 2);
/// assert_eq!(routes[0].method, "GET");
/// assert_eq!(routes[1].path_template, "api/shorthand");
/// assert_eq!(service.environment_for("hello")["MY_SIMPLE"], "simple value");
/// ```
#[derive(Debug, Clone)]
pub struct Service {
    name: String,
    service_path: PathBuf,
    manifest_path: PathBuf,
    provider_environment: IndexMap<String, String>,
    functions: IndexMap<String, FunctionSpec>,
}

impl Service {
    /// Loads the manifest found in `service_path`.
    pub fn load(service_path: impl AsRef<Path>, options: &LoadOptions) -> ManifestResult<Self> {
        let service_path = service_path.as_ref();
        let manifest_path = manifest_file_in(service_path, &options.manifest_names)
            .ok_or_else(|| ManifestError::not_found(service_path))?;

        let text = std::fs::read_to_string(&manifest_path).map_err(|source| ManifestError::Read {
            path: manifest_path.clone(),
            source,
        })?;

        Self::parse(&text, service_path, manifest_path, options)
    }

    /// Loads a service from manifest text, as if it lived in `service_path`.
    pub fn from_yaml(
        text: &str,
        service_path: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> ManifestResult<Self> {
        let service_path = service_path.as_ref();
        let manifest_path = service_path.join(DEFAULT_MANIFEST_NAMES[0]);
        Self::parse(text, service_path, manifest_path, options)
    }

    fn parse(
        text: &str,
        service_path: &Path,
        manifest_path: PathBuf,
        options: &LoadOptions,
    ) -> ManifestResult<Self> {
        let raw: Value = serde_yaml::from_str(text).map_err(|source| ManifestError::Parse {
            path: manifest_path.clone(),
            source,
        })?;
        let resolved = resolve_variables(&raw, &options.sources)?;
        let document: ManifestDocument =
            serde_json::from_value(resolved).map_err(|source| ManifestError::Schema {
                path: manifest_path.clone(),
                source,
            })?;

        let mut functions = IndexMap::with_capacity(document.functions.len());
        for (name, decl) in &document.functions {
            let http_events = decl
                .events
                .iter()
                .flatten()
                .map(|event| HttpEvent::from_event(name, event))
                .filter_map(Result::transpose)
                .collect::<ManifestResult<Vec<_>>>()?;

            debug!(function = %name, handler = %decl.handler, http_events = http_events.len(), "loaded function");

            functions.insert(
                name.clone(),
                FunctionSpec {
                    name: name.clone(),
                    handler: HandlerRef::new(decl.handler.clone()),
                    environment: environment_strings(decl.environment.as_ref()),
                    http_events,
                },
            );
        }

        let service = Self {
            name: document.service.name().to_string(),
            service_path: service_path.to_path_buf(),
            manifest_path,
            provider_environment: environment_strings(document.provider.environment.as_ref()),
            functions,
        };

        info!(
            service = %service.name,
            manifest = %service.manifest_path.display(),
            functions = service.functions.len(),
            routes = service.route_count(),
            "service manifest loaded"
        );

        Ok(service)
    }

    /// The service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The directory holding the manifest.
    #[must_use]
    pub fn service_path(&self) -> &Path {
        &self.service_path
    }

    /// The manifest file.
    #[must_use]
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// The provider-level environment.
    #[must_use]
    pub const fn provider_environment(&self) -> &IndexMap<String, String> {
        &self.provider_environment
    }

    /// Declared functions in order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionSpec> {
        self.functions.values()
    }

    /// Looks up a function by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.get(name)
    }

    /// Every http route, in function then event declaration order.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteTemplate> {
        self.functions
            .values()
            .flat_map(|function| {
                function.http_events.iter().map(|event| {
                    RouteTemplate::new(
                        function.name.clone(),
                        &event.method,
                        event.path.clone(),
                        function.handler.clone(),
                    )
                })
            })
            .collect()
    }

    /// The environment a function runs with: provider values, overridden by
    /// the function's own.
    #[must_use]
    pub fn environment_for(&self, function: &str) -> IndexMap<String, String> {
        let mut environment = self.provider_environment.clone();
        if let Some(spec) = self.functions.get(function) {
            environment.extend(spec.environment.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        environment
    }

    fn route_count(&self) -> usize {
        self.functions.values().map(|f| f.http_events.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const BASIC: &str = r#"
service: basic
provider:
  name: aws
  stage: ${opt:stage, 'dev'}
  environment:
    MY_SIMPLE: simple value
    SHARED: provider
    STAGE: ${self:provider.stage}
functions:
  hello:
    handler: handler.hello
    events:
      - http:
          path: api/hello
          method: get
      - http:
          path: api/hello/{name}
          method: get
  shorthand:
    handler: handler.hello
    events:
      - http: GET api/shorthand
  worker:
    handler: jobs.run
    events:
      - schedule: rate(1 minute)
  env:
    handler: handler.env
    environment:
      SHARED: function
      TABLE: ${env:HERMES_TEST_TABLE, 'local-table'}
    events:
      - http:
          path: api/env
          method: get
"#;

    fn options() -> LoadOptions {
        LoadOptions {
            sources: VariableSources::new(),
            ..LoadOptions::default()
        }
    }

    #[test]
    fn test_routes_in_declaration_order() {
        let service = Service::from_yaml(BASIC, "/srv/basic", &options()).unwrap();
        let routes: Vec<_> = service
            .routes()
            .into_iter()
            .map(|r| (r.function_name, r.method, r.path_template))
            .collect();
        assert_eq!(
            routes,
            vec![
                ("hello".into(), "GET".into(), "api/hello".into()),
                ("hello".into(), "GET".into(), "api/hello/{name}".into()),
                ("shorthand".into(), "GET".into(), "api/shorthand".into()),
                ("env".into(), "GET".into(), "api/env".into()),
            ]
        );
    }

    #[test]
    fn test_function_without_http_events_kept() {
        let service = Service::from_yaml(BASIC, "/srv/basic", &options()).unwrap();
        let worker = service.function("worker").unwrap();
        assert!(worker.http_events.is_empty());
        assert_eq!(worker.handler.module(), "jobs");
    }

    #[test]
    fn test_environment_merge() {
        let service = Service::from_yaml(BASIC, "/srv/basic", &options()).unwrap();
        let env = service.environment_for("env");
        assert_eq!(env["MY_SIMPLE"], "simple value");
        assert_eq!(env["SHARED"], "function");
        assert_eq!(env["STAGE"], "dev");
        assert_eq!(env["TABLE"], "local-table");

        let hello = service.environment_for("hello");
        assert_eq!(hello["SHARED"], "provider");
        assert!(!hello.contains_key("TABLE"));
    }

    #[test]
    fn test_options_feed_variables() {
        let options = LoadOptions {
            sources: VariableSources::new()
                .with_option("stage", "prod")
                .with_env_var("HERMES_TEST_TABLE", "orders"),
            ..LoadOptions::default()
        };
        let service = Service::from_yaml(BASIC, "/srv/basic", &options).unwrap();
        let env = service.environment_for("env");
        assert_eq!(env["STAGE"], "prod");
        assert_eq!(env["TABLE"], "orders");
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("serverless.yml"), BASIC).unwrap();

        let service = Service::load(dir.path(), &options()).unwrap();
        assert_eq!(service.name(), "basic");
        assert_eq!(service.service_path(), dir.path());
        assert!(service.manifest_path().ends_with("serverless.yml"));
    }

    #[test]
    fn test_load_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = Service::load(dir.path(), &options()).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Service::from_yaml("service: [unclosed", "/srv/x", &options()).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn test_missing_handler_is_schema_error() {
        let yaml = "service: x\nfunctions:\n  f:\n    events: []\n";
        let err = Service::from_yaml(yaml, "/srv/x", &options()).unwrap_err();
        assert!(matches!(err, ManifestError::Schema { .. }));
    }

    #[test]
    fn test_bad_http_event_names_function() {
        let yaml = "service: x\nfunctions:\n  broken:\n    handler: h.f\n    events:\n      - http: GET\n";
        let err = Service::from_yaml(yaml, "/srv/x", &options()).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidEvent { function, .. } if function == "broken"));
    }
}
