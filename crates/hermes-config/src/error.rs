//! Harness configuration errors.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Text formats a harness configuration can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML, the usual `hermes.toml`.
    Toml,
    /// JSON.
    Json,
}

impl ConfigFormat {
    /// Parses a format name such as `"toml"`, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Picks the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_name)
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        })
    }
}

/// Errors raised while loading or validating a harness configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration file that was asked for does not exist.
    #[error("harness configuration {} does not exist", path.display())]
    FileNotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// A configuration file exists but could not be read.
    #[error("cannot read harness configuration {}", path.display())]
    ReadError {
        /// The unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration source is not valid in its format, or names keys
    /// the harness does not know.
    #[error("invalid {format} harness configuration{}: {source}", origin(path.as_deref()))]
    Parse {
        /// The file, or `None` for configuration given as a string.
        path: Option<PathBuf>,
        /// The format it was parsed as.
        format: ConfigFormat,
        /// Parser error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The format name or file extension is neither TOML nor JSON.
    #[error("unsupported harness configuration format {found:?}")]
    UnsupportedFormat {
        /// The name or extension that was given.
        found: String,
    },

    /// A field holds a value the harness cannot use.
    #[error("invalid harness configuration value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field name, e.g. `service.manifest_names`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `HERMES__SECTION__KEY` override could not be parsed.
    #[error("invalid override {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// What is wrong with its value.
        reason: String,
    },
}

fn origin(path: Option<&Path>) -> String {
    path.map(|path| format!(" in {}", path.display()))
        .unwrap_or_default()
}

impl ConfigError {
    /// A missing configuration file.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// An unreadable configuration file.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// A parse failure, with the file it came from when there is one.
    pub fn parse(
        path: Option<&Path>,
        format: ConfigFormat,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Parse {
            path: path.map(Path::to_path_buf),
            format,
            source: Box::new(source),
        }
    }

    /// A format name or extension that is not supported.
    pub fn unsupported_format(found: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            found: found.into(),
        }
    }

    /// A field with an unusable value.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// An override that does not parse.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
