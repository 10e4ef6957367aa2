//! HTTP response handling for errors

use super::types::MetricsError;
use crate::core::security::HASH_HEADER;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

impl ResponseError for MetricsError {
    fn status_code(&self) -> StatusCode {
        match self {
            MetricsError::BadRequest(_)
            | MetricsError::SignatureMismatch { .. }
            | MetricsError::Serialization(_)
            | MetricsError::Yaml(_) => StatusCode::BAD_REQUEST,
            MetricsError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            MetricsError::NotFound(_) => StatusCode::NOT_FOUND,
            MetricsError::Forbidden(_) => StatusCode::FORBIDDEN,
            MetricsError::Shared(inner) => inner.status_code(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let (error_code, message) = match self {
            MetricsError::BadRequest(_) | MetricsError::SignatureMismatch { .. } => {
                ("BAD_REQUEST", self.to_string())
            }
            MetricsError::Serialization(_) | MetricsError::Yaml(_) => {
                ("PARSING_ERROR", self.to_string())
            }
            MetricsError::NotImplemented(_) => ("NOT_IMPLEMENTED", self.to_string()),
            MetricsError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            MetricsError::Forbidden(_) => ("FORBIDDEN", self.to_string()),
            MetricsError::Database(_) => (
                "DATABASE_ERROR",
                "Database operation failed".to_string(),
            ),
            MetricsError::Shared(inner) => return inner.error_response(),
            _ => (
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: error_code.to_string(),
                message,
                timestamp: chrono::Utc::now().timestamp(),
            },
        };

        let mut response = HttpResponse::build(status_code);
        if let MetricsError::SignatureMismatch { digest } = self {
            response.insert_header((HASH_HEADER, digest.as_str()));
        }
        response.json(error_response)
    }
}

/// Standard error response format
#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: i64,
}
