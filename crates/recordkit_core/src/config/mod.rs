//! Application configuration and session configuration maps.
//!
//! # Responsibility
//! - Load key-value application settings with defaults and env overrides.
//! - Write the effective settings back so users can edit them.
//! - Hand the persistence layer an opaque `SessionConfig` map.
//!
//! # Invariants
//! - Keys are lowercase identifiers (`[a-z][a-z0-9_]*`).
//! - A missing or unreadable file never prevents startup; defaults apply.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod app_config;
mod session_config;

pub use app_config::{AppConfig, DEFAULT_CONFIG_FILE_NAME, ENV_PREFIX};
pub use session_config::SessionConfig;

pub type AppConfigResult<T> = Result<T, AppConfigError>;

#[derive(Debug)]
pub enum AppConfigError {
    /// Key is not a lowercase identifier.
    InvalidKey(String),
    /// Configuration source could not be merged.
    Source(::config::ConfigError),
    /// Writing the configuration file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for AppConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(f, "invalid configuration key `{key}`"),
            Self::Source(err) => write!(f, "{err}"),
            Self::Io { path, source } => {
                write!(f, "failed to write `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for AppConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidKey(_) => None,
            Self::Source(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<::config::ConfigError> for AppConfigError {
    fn from(value: ::config::ConfigError) -> Self {
        Self::Source(value)
    }
}
