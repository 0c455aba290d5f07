//! Error types for the SPH solver.
//!
//! Stepping the simulation never fails. The only fallible surface is building a
//! solver from a configuration, which may be invalid or may fail to load from disk.

use std::fmt;

/// Errors that can occur while loading or validating a [`SphConfig`](crate::SphConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// A configuration value is outside its allowed range.
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Human readable explanation.
        reason: String,
    },
    /// Failed to read or write the configuration file.
    Io(std::io::Error),
    /// The configuration file is not valid JSON for [`SphConfig`](crate::SphConfig).
    Json(serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the rejected field, if this is a validation error.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConfigError::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { field, reason } => {
                write!(f, "Invalid configuration value `{}`: {}", field, reason)
            }
            ConfigError::Io(e) => write!(f, "Failed to access configuration file: {}", e),
            ConfigError::Json(e) => write!(f, "Failed to parse configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}
