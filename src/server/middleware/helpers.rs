//! Helper functions for middleware

use actix_web::http::header::HeaderMap;
use std::net::IpAddr;

pub const REAL_IP_HEADER: &str = "X-Real-IP";
pub const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";

/// Client address as reported by the sender or a proxy
///
/// `X-Real-IP` wins; otherwise the first `X-Forwarded-For` entry is used.
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(value) = headers.get(REAL_IP_HEADER) {
        return value.to_str().ok()?.trim().parse().ok();
    }

    headers
        .get(FORWARDED_FOR_HEADER)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Check if a route writes metrics
pub fn is_ingestion_route(path: &str) -> bool {
    const INGESTION_ROUTES: &[&str] = &["/update"];

    INGESTION_ROUTES.iter().any(|&route| path.starts_with(route))
}
