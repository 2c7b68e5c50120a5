//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Collapse a list of problems into one validation error.
    pub fn from_problems(problems: &[String]) -> Option<Self> {
        match problems {
            [] => None,
            [single] => Some(Self::Validation(single.clone())),
            many => Some(Self::Validation(format!("\n- {}", many.join("\n- ")))),
        }
    }
}
