//! Error types for armorsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while building or validating a [`crate::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `POLL_TIME` (or `poll_interval_secs`) is not a positive whole number of seconds.
    #[error("invalid poll interval '{value}': expected a positive number of seconds")]
    InvalidPollInterval { value: String },

    /// `LINK_STRATEGY` names an unknown strategy.
    #[error("unknown link strategy '{value}'; expected: hardlink, copy")]
    InvalidStrategy { value: String },

    /// The profiler binary does not exist at the configured path.
    #[error("profiler binary not found at {path}")]
    ProfilerMissing { path: PathBuf },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Convenience constructor for [`ConfigError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
