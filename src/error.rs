use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::EmbeddingError;

/// Main error type for Mnemo operations
#[derive(Error, Debug)]
pub enum MnemoError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Embedding capability errors; there is no degraded-embedding fallback,
    /// so these are fatal for the call that triggered them
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for Mnemo operations
pub type Result<T> = std::result::Result<T, MnemoError>;
