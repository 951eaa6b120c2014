//! Manifest error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Errors that can occur while locating or loading a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// No manifest in the start directory or any of its ancestors.
    #[error("Cannot find serverless.yml. Started search in working directory {}", start_dir.display())]
    NotFound {
        /// Where the upward search started.
        start_dir: PathBuf,
    },

    /// The current working directory could not be determined.
    #[error("cannot determine the current working directory: {source}")]
    CurrentDir {
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest file could not be read.
    #[error("failed to read manifest {}: {source}", path.display())]
    Read {
        /// Manifest path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid YAML.
    #[error("failed to parse manifest {}: {source}", path.display())]
    Parse {
        /// Manifest path.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest parsed but does not have the expected shape.
    #[error("invalid manifest {}: {source}", path.display())]
    Schema {
        /// Manifest path.
        path: PathBuf,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// An `http` event could not be interpreted.
    #[error("invalid http event in function \"{function}\": {reason}")]
    InvalidEvent {
        /// Declaring function.
        function: String,
        /// What was wrong.
        reason: String,
    },

    /// A variable reference has no value and no default.
    #[error("unresolved variable \"{variable}\" at {location}")]
    UnresolvedVariable {
        /// The variable expression, e.g. `${env:API_KEY}`.
        variable: String,
        /// Dotted location of the value containing it.
        location: String,
    },

    /// `${self:...}` references form a cycle.
    #[error("variable cycle: {}", chain.join(" -> "))]
    VariableCycle {
        /// The self-references involved, in resolution order.
        chain: Vec<String>,
    },
}

impl ManifestError {
    /// Create a new not-found error.
    pub fn not_found(start_dir: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            start_dir: start_dir.into(),
        }
    }

    /// Create a new invalid-event error.
    pub fn invalid_event(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEvent {
            function: function.into(),
            reason: reason.into(),
        }
    }

    /// Create a new unresolved-variable error.
    pub fn unresolved(variable: impl Into<String>, location: impl Into<String>) -> Self {
        Self::UnresolvedVariable {
            variable: variable.into(),
            location: location.into(),
        }
    }
}
