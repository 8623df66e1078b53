//! Error types.
//!
//! Only storage opening and config loading hand errors back to callers.
//! The state systems recover from everything else locally.

use std::io;

use thiserror::Error;

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Error, Debug)]
pub enum StorageError {
    /// Storage is disabled or otherwise not reachable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write because it is full.
    #[error("storage quota exceeded writing {key}")]
    QuotaExceeded {
        /// Key of the rejected write.
        key: String,
    },

    /// Backing file could not be read or written.
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),

    /// Backing file is not a JSON object of strings.
    #[error("storage file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading a [`MotionConfig`](crate::config::MotionConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file is missing or could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),

    /// Config file is not valid TOML, or a field has the wrong type.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
