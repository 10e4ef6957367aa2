//! Helper functions for creating and classifying errors

use super::types::MetricsError;

impl MetricsError {
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_implemented<S: Into<String>>(message: S) -> Self {
        Self::NotImplemented(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn crypto<S: Into<String>>(message: S) -> Self {
        Self::Crypto(message.into())
    }

    pub fn signature_mismatch<S: Into<String>>(digest: S) -> Self {
        Self::SignatureMismatch {
            digest: digest.into(),
        }
    }

    /// Whether a failed delivery may succeed if attempted again.
    ///
    /// Connection failures, timeouts and 5xx answers are transient; a 4xx
    /// answer means the server rejected the message itself.
    pub fn is_transient(&self) -> bool {
        match self {
            MetricsError::HttpClient(e) => {
                e.is_connect() || e.is_timeout() || e.is_request() || e.is_body()
            }
            MetricsError::Transport { status, .. } => *status >= 500,
            MetricsError::Database(_) | MetricsError::Io(_) => true,
            MetricsError::Shared(inner) => inner.is_transient(),
            _ => false,
        }
    }
}
