//! Tests for error handling

use super::types::MetricsError;
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use std::sync::Arc;

#[test]
fn test_error_creation() {
    let error = MetricsError::bad_request("empty id");
    assert!(matches!(error, MetricsError::BadRequest(msg) if msg == "empty id"));

    let error = MetricsError::not_implemented("histogram");
    assert!(matches!(error, MetricsError::NotImplemented(_)));
}

#[test]
fn test_status_codes() {
    assert_eq!(
        MetricsError::bad_request("x").status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        MetricsError::not_implemented("x").status_code(),
        StatusCode::NOT_IMPLEMENTED
    );
    assert_eq!(
        MetricsError::not_found("x").status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        MetricsError::forbidden("x").status_code(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        MetricsError::internal("x").status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_shared_error_keeps_status() {
    let shared = MetricsError::Shared(Arc::new(MetricsError::not_found("Requests")));
    assert_eq!(shared.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(shared.to_string(), "Not found: Requests");
}

#[test]
fn test_serialization_error_is_bad_request() {
    let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let error = MetricsError::from(err);
    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_transient_classification() {
    let server_side = MetricsError::Transport {
        status: 503,
        message: "unavailable".to_string(),
    };
    assert!(server_side.is_transient());

    let rejected = MetricsError::Transport {
        status: 400,
        message: "bad signature".to_string(),
    };
    assert!(!rejected.is_transient());

    assert!(!MetricsError::bad_request("x").is_transient());
}

#[test]
fn test_error_response_body() {
    let response = MetricsError::not_found("Temp").error_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_signature_mismatch_echoes_digest() {
    let response = MetricsError::signature_mismatch("abc123").error_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response
            .headers()
            .get(crate::core::security::HASH_HEADER)
            .unwrap()
            .to_str()
            .unwrap(),
        "abc123"
    );
}
