//! Error types for the metrics pipeline

use thiserror::Error;

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Main error type
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed metric id, type or value
    #[error("Validation error: {0}")]
    Validation(String),

    /// Metric was never written
    #[error("Not found: {0}")]
    NotFound(String),

    /// Signature mismatch or missing signature on a protected payload
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    /// Encryption, decryption or key loading failures
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Conflicting writes kept failing after the whole backoff schedule
    #[error("max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded { attempts: usize },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File or snapshot storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network errors
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}
