use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

/// Validates incoming requests for common security issues: path traversal in
/// the URI and oversized bodies. Rejections happen before routing.
pub async fn validate_request_middleware(req: Request, next: Next) -> Response {
    let uri_path = req.uri().path();
    if contains_path_traversal(uri_path) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "code": "INVALID_PATH",
                    "message": "Path traversal detected in request",
                },
                "status": 400,
            })),
        )
            .into_response();
    }

    // Redundant with DefaultBodyLimit but rejects before the body is read
    if matches!(req.method(), &axum::http::Method::POST | &axum::http::Method::PUT) {
        if let Some(content_length) = req.headers().get("content-length") {
            if let Ok(length_str) = content_length.to_str() {
                if let Ok(length) = length_str.parse::<usize>() {
                    let max_body_size = std::env::var("IRKATALOG_MAX_BODY_SIZE")
                        .ok()
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(1024 * 1024)
                        .clamp(64 * 1024, 10 * 1024 * 1024);
                    if length > max_body_size {
                        return (
                            StatusCode::PAYLOAD_TOO_LARGE,
                            Json(json!({
                                "error": {
                                    "code": "PAYLOAD_TOO_LARGE",
                                    "message": format!("Request body exceeds maximum size of {} bytes", max_body_size),
                                },
                                "status": 413,
                            })),
                        ).into_response();
                    }
                }
            }
        }
    }

    next.run(req).await
}

/// Check if a path contains traversal attempts, including encoded variants.
fn contains_path_traversal(path: &str) -> bool {
    let lower = path.to_lowercase();

    if path.contains("/..") || path.starts_with("..") {
        return true;
    }

    if path.contains("/./") {
        return true;
    }

    // Multiple dots (bypass attempt: ....)
    if path.contains("....") {
        return true;
    }

    // URL-encoded variants (single and double encoding)
    let encoded_patterns = [
        "%2e%2e", "%252e%252e", "%2e/", "%252e%2f", "/%2e", "%2f%2e", "%00",
    ];
    for pattern in &encoded_patterns {
        if lower.contains(pattern) {
            return true;
        }
    }

    path.contains('\0')
}

/// Validates the format of a UUID string from a path parameter.
pub fn validate_uuid(id: &str) -> Result<Uuid, (StatusCode, Json<serde_json::Value>)> {
    Uuid::parse_str(id).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "code": "INVALID_UUID",
                    "message": format!("Invalid UUID format: {}", id),
                },
                "status": 400,
            })),
        )
    })
}

/// Validates a device path as accepted by the storage layer: absolute,
/// forward-slash separated, no traversal, bounded length.
pub fn validate_device_path(path: &str) -> Result<String, (StatusCode, Json<serde_json::Value>)> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "code": "INVALID_PATH",
                    "message": "Path must not be empty"
                }
            })),
        ));
    }
    if !trimmed.starts_with('/') {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "code": "INVALID_PATH",
                    "message": "Path must be an absolute device path"
                }
            })),
        ));
    }
    if trimmed.contains('\0') {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "code": "INVALID_PATH",
                    "message": "Path contains null byte"
                }
            })),
        ));
    }

    if contains_path_traversal(trimmed) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "code": "PATH_TRAVERSAL",
                    "message": "Path traversal attempt detected",
                },
                "status": 400,
            })),
        ));
    }

    const MAX_PATH_LENGTH: usize = 4096;
    if trimmed.len() > MAX_PATH_LENGTH {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "code": "PATH_TOO_LONG",
                    "message": format!("Path exceeds maximum length of {} characters", MAX_PATH_LENGTH),
                },
                "status": 400,
            })),
        ));
    }

    Ok(trimmed.to_string())
}

/// Validates the per-request scan options.
pub fn validate_scan_options(
    read_concurrency: Option<usize>,
) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    if let Some(conc) = read_concurrency {
        // Transport budget; must agree with config.rs
        const MAX_READ_CONCURRENCY: usize = 8;
        if conc == 0 || conc > MAX_READ_CONCURRENCY {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": {
                        "code": "INVALID_CONCURRENCY",
                        "message": format!("read_concurrency must be between 1 and {}", MAX_READ_CONCURRENCY),
                    },
                    "status": 400,
                })),
            ));
        }
    }

    Ok(())
}

/// Sanitizes user input for logging: strips control characters, caps length.
pub fn sanitize_for_logging(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .take(200)
        .collect::<String>()
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\'', "\\\'")
}
