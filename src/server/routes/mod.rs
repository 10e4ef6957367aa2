//! HTTP route modules

pub mod diagnostics;
pub mod health;
pub mod index;
pub mod update;
pub mod value;

use actix_web::web;

/// Standard envelope for diagnostics responses
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T>
where
    T: serde::Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Mount every ingestion listener route
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(update::configure_routes)
        .configure(value::configure_routes)
        .configure(health::configure_routes)
        .configure(index::configure_routes);
}
