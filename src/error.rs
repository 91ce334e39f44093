// Error types for zapcfg
// Uses thiserror so loader failures carry the offending path

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while loading or exporting a scan configuration.
///
/// A configuration without a spider (or scanner, api) block is not an error;
/// those accessors return `None` instead.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration directory not found: {}", path.display())]
    MissingDirectory { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Fragment {} must contain a mapping at the top level", path.display())]
    NotAMapping { path: PathBuf },

    #[error("Merged configuration does not match the schema: {0}")]
    Schema(#[source] serde_yaml::Error),

    #[error("Invalid path pattern '{pattern}' in context '{context}': {source}")]
    InvalidPattern {
        context: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Forced context '{0}' is not declared in any fragment")]
    UnknownContext(String),

    #[error("Failed to export configuration: {0}")]
    Export(String),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
