//! Error types for configuration loading and source reading.

use std::path::PathBuf;

use cmdoc_markdown::SchemaError;
use thiserror::Error;

/// Errors that can occur while loading a merge configuration or its sources.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A source file could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Configuration validation failure (e.g., duplicate source ids).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A source document does not follow the command grammar.
    #[error("source '{id}' is not a valid command document: {error}")]
    InvalidSource { id: String, error: SchemaError },

    /// The requested command is missing from a source document.
    #[error("source '{id}' does not document command '{command}'")]
    CommandNotFound { id: String, command: String },

    /// A source document contains no command at all.
    #[error("source '{0}' contains no command")]
    EmptySource(String),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
