//! Error types for access resolution

use thiserror::Error;

/// Access resolution errors
#[derive(Debug, Error)]
pub enum AccessError {
    /// Persistent role storage could not be queried
    #[error("Role storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Cache backend error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Role-access map could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for access resolution
pub type Result<T> = std::result::Result<T, AccessError>;
