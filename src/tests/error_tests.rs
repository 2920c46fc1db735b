use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use serde_json::Value;

use crate::error::{AppError, OptionExt};
use crate::storage::StorageError;

async fn render(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn not_found_renders_as_404_envelope() {
    let (status, body) = render(AppError::NotFound("scan not found".into())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "scan not found");
    assert_eq!(body["status"], 404);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn internal_errors_hide_details_but_carry_an_error_id() {
    let (status, body) = render(AppError::Internal(anyhow::anyhow!("secret detail"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert!(!body["error"]["message"].as_str().unwrap().contains("secret"));
    assert!(body["error"]["details"]["error_id"].is_string());
}

#[tokio::test]
async fn validation_errors_name_the_field() {
    let err = AppError::ValidationError { field: "brand".into(), message: "must not be empty".into() };
    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["field"], "brand");
}

#[tokio::test]
async fn storage_errors_map_by_variant() {
    let (status, body) = render(AppError::Storage(StorageError::NotFound("/x".into()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "STORAGE_NOT_FOUND");

    let (status, body) = render(AppError::Storage(StorageError::Timeout("/x".into()))).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["code"], "STORAGE_TIMEOUT");

    let (status, body) = render(AppError::Storage(StorageError::Unavailable("link down".into()))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "STORAGE_ERROR");
}

#[tokio::test]
async fn rate_limited_carries_retry_after() {
    let (status, body) = render(AppError::RateLimited { retry_after_seconds: 17 }).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["details"]["retry_after_seconds"], 17);
}

#[test]
fn sqlx_row_not_found_becomes_not_found() {
    let err: AppError = sqlx::Error::RowNotFound.into();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn option_ext_maps_none_to_not_found() {
    let found: Result<i32, _> = Some(1).ok_or_not_found("scan");
    assert_eq!(found.unwrap(), 1);

    let missing: Result<i32, _> = None.ok_or_not_found("scan");
    match missing {
        Err(AppError::NotFound(msg)) => assert_eq!(msg, "scan not found"),
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
}
