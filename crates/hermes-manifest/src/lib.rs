//! Manifest discovery and loading for Hermes.
//!
//! Reads the subset of `serverless.yml` a local invocation needs: the
//! service name, provider and function environments, handler references and
//! `http` events (object and shorthand forms).
//!
//! # Example
//!
//! ```rust,no_run
//! use hermes_manifest::{find_service_path_from_cwd, LoadOptions, Service, DEFAULT_MANIFEST_NAMES};
//!
//! let service_path = find_service_path_from_cwd(&DEFAULT_MANIFEST_NAMES)?;
//! let service = Service::load(&service_path, &LoadOptions::default())?;
//!
//! for route in service.routes() {
//!     println!("{} {} -> {}", route.method, route.path_template, route.handler_ref);
//! }
//! # Ok::<(), hermes_manifest::ManifestError>(())
//! ```

mod discover;
mod error;
mod schema;
mod service;
mod variables;

pub use discover::{find_service_path, find_service_path_from_cwd, manifest_file_in, DEFAULT_MANIFEST_NAMES};
pub use error::{ManifestError, ManifestResult};
pub use schema::{environment_strings, FunctionDecl, HttpEvent, ManifestDocument, ProviderDecl, ServiceDecl};
pub use service::{FunctionSpec, LoadOptions, Service};
pub use variables::{resolve_variables, VariableSources};
