//! Error type definitions

use std::sync::Arc;
use thiserror::Error;

/// Result type alias for the metrics pipeline
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Main error type for the metrics pipeline
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Malformed or negative value, empty id, kind change
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// `HashSHA256` did not match; carries the digest the server computed
    #[error("Bad request: HashSHA256 signature mismatch")]
    SignatureMismatch { digest: String },

    /// Unknown metric kind
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Unknown metric on read
    #[error("Not found: {0}")]
    NotFound(String),

    /// Signature, decryption or trusted subnet check failed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key material and cipher errors
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Non-success response from the ingestion server
    #[error("Transport error: server responded {status}: {message}")]
    Transport { status: u16, message: String },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

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

    /// An error produced once and handed out to every waiter of a deduplicated request
    #[error(transparent)]
    Shared(Arc<MetricsError>),
}
