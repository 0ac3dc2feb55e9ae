//! Error types for the gazetteer.

use thiserror::Error;

/// Gazetteer error type
#[derive(Debug, Error)]
pub enum GazetteerError {
    /// Embedded store failure (open, read, write, flush)
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization failure
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The candidate index image failed validation
    #[error("corrupt image {file}: {reason}")]
    CorruptImage { file: String, reason: String },

    /// A stored record has an unexpected layout
    #[error("corrupt record in table {table} at key {key}")]
    CorruptRecord { table: &'static str, key: u64 },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// The repository handle was used after a fatal failure or after close
    #[error("repository is closed")]
    Closed,
}

impl GazetteerError {
    pub fn corrupt_image(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptImage {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, GazetteerError>;
