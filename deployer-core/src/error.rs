//! Error types for deployer-core.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration failures. None of these are retryable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the offending file path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// No config file at any of the searched locations.
    #[error("no deployer config found (searched: {})", display_paths(searched))]
    NotFound { searched: Vec<PathBuf> },

    /// The requested environment has no profile.
    #[error("unknown environment '{name}' (known: {})", known.join(", "))]
    UnknownEnvironment { name: String, known: Vec<String> },

    /// A profile field that must be non-empty is empty.
    #[error("environment '{environment}' is missing required field '{field}'")]
    MissingField {
        environment: String,
        field: &'static str,
    },

    #[error("config declares no environments")]
    NoEnvironments,

    #[error("max_retries must be at least 1, got {0}")]
    InvalidRetries(u32),
}

/// Missing credentials in the process-wide settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{name} is not set")]
    MissingSetting { name: String },
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
