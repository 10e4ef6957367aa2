//! Storage liveness endpoint

use crate::server::state::AppState;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, Result as ActixResult, web};
use tracing::{debug, error};

/// Configure health route
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ping", web::get().to(ping));
}

/// `GET /ping`
///
/// Answers `pong` when the storage backend is reachable.
pub async fn ping(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("Ping requested");

    match state.storage().ping().await {
        Ok(()) => Ok(HttpResponse::Ok()
            .content_type(ContentType::plaintext())
            .body("pong")),
        Err(e) => {
            error!("Storage ping failed: {}", e);
            Ok(HttpResponse::InternalServerError()
                .content_type(ContentType::plaintext())
                .body(e.to_string()))
        }
    }
}
