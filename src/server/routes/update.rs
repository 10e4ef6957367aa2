//! Metric ingestion endpoints

use crate::agent::transport::IDEMPOTENCY_HEADER;
use crate::core::security::HASH_HEADER;
use crate::server::receiver::Ingested;
use crate::server::state::AppState;
use actix_web::http::header::{ContentType, HeaderMap};
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use bytes::Bytes;
use tracing::debug;

/// Configure ingestion routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/update/", web::post().to(update_json))
        .route("/update", web::post().to(update_json))
        .route("/updates/", web::post().to(update_batch))
        .route("/updates", web::post().to(update_batch))
        .route(
            "/update/{kind}/{name}/{value}",
            web::post().to(update_from_path),
        );
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn json_response(ingested: Ingested) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    response.content_type(ContentType::json());
    if let Some(digest) = ingested.digest {
        response.insert_header((HASH_HEADER, digest));
    }
    response.body(ingested.body.as_str().to_owned())
}

/// `POST /update/{kind}/{name}/{value}`
pub async fn update_from_path(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
) -> ActixResult<HttpResponse> {
    let (kind, name, value) = path.into_inner();
    debug!("Update {} {} = {}", kind, name, value);

    let text = state.receiver.ingest_text(&kind, &name, &value).await?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(text))
}

/// `POST /update/` with one JSON envelope
pub async fn update_json(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Bytes,
) -> ActixResult<HttpResponse> {
    let ingested = state
        .receiver
        .ingest_one(
            &body,
            header(req.headers(), HASH_HEADER),
            header(req.headers(), IDEMPOTENCY_HEADER),
        )
        .await?;
    Ok(json_response(ingested))
}

/// `POST /updates/` with a JSON array of envelopes
pub async fn update_batch(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Bytes,
) -> ActixResult<HttpResponse> {
    let ingested = state
        .receiver
        .ingest_batch(
            &body,
            header(req.headers(), HASH_HEADER),
            header(req.headers(), IDEMPOTENCY_HEADER),
        )
        .await?;
    debug!(replayed = ingested.replayed, "Batch ingested");
    Ok(json_response(ingested))
}
