//! Typed configuration for the Hermes invocation harness.
//!
//! Configuration is layered: defaults → TOML or JSON file → environment
//! overrides. Unknown fields are rejected.
//!
//! # Example
//!
//! ```no_run
//! use hermes_config::ConfigLoader;
//!
//! # fn main() -> Result<(), hermes_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("hermes.toml")?
//!     .with_env_prefix("HERMES")
//!     .load()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [service]
//! path = "tests/fixtures/basic"
//! manifest_names = ["serverless.yml", "serverless.yaml"]
//! stage = "test"
//! region = "us-east-1"
//!
//! [invocation]
//! apply_process_env = true
//!
//! [logging]
//! enabled = true
//! level = "warn"
//! format = "pretty"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `HERMES__SERVICE__PATH`, `HERMES__SERVICE__STAGE`, `HERMES__SERVICE__REGION`
//! - `HERMES__SERVICE__MANIFEST_NAMES` (comma separated)
//! - `HERMES__INVOCATION__APPLY_PROCESS_ENV`
//! - `HERMES__LOGGING__ENABLED`, `HERMES__LOGGING__LEVEL`, `HERMES__LOGGING__FORMAT`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{HermesConfig, HermesConfigBuilder};
pub use error::{ConfigError, ConfigFormat};
pub use loader::ConfigLoader;
pub use schema::*;
