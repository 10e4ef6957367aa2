//! Metric lookup endpoints

use crate::core::metrics::Envelope;
use crate::server::state::AppState;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, Result as ActixResult, web};

/// Configure lookup routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/value/", web::post().to(value_json))
        .route("/value", web::post().to(value_json))
        .route("/value/{kind}/{name}", web::get().to(value_text));
}

/// `GET /value/{kind}/{name}`
pub async fn value_text(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ActixResult<HttpResponse> {
    let (kind, name) = path.into_inner();
    let metric = state.store.get_typed(&kind, &name)?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(metric.text()))
}

/// `POST /value/` with `{"id", "type"}`
pub async fn value_json(
    state: web::Data<AppState>,
    query: web::Json<Envelope>,
) -> ActixResult<HttpResponse> {
    let metric = state.store.get_typed(&query.mtype, &query.id)?;
    Ok(HttpResponse::Ok().json(metric.to_envelope()))
}
