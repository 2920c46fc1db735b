use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

// Health check endpoint - lightweight, no rate limiting
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// Readiness probe: checks DB connectivity with timeout protection
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let query = sqlx::query("SELECT 1").fetch_one(&state.db);
    match tokio::time::timeout(std::time::Duration::from_secs(5), query).await {
        Ok(Ok(_)) => (StatusCode::OK, "ready").into_response(),
        Ok(Err(e)) => (StatusCode::SERVICE_UNAVAILABLE, format!("not ready: {}", e)).into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "not ready: timeout").into_response(),
    }
}

// Metrics endpoint: returns JSON snapshot
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.metrics.get_snapshot();
    Json(snapshot)
}

// Prometheus-compatible text exposition format
pub async fn metrics_prometheus(State(state): State<AppState>) -> impl IntoResponse {
    let m = state.metrics.get_snapshot();
    let body = format!(
        "# HELP irkatalog_scans_started Total scans started\n# TYPE irkatalog_scans_started counter\nirkatalog_scans_started {}\n\
# HELP irkatalog_scans_completed Total scans completed\n# TYPE irkatalog_scans_completed counter\nirkatalog_scans_completed {}\n\
# HELP irkatalog_scans_failed Total scans failed\n# TYPE irkatalog_scans_failed counter\nirkatalog_scans_failed {}\n\
# HELP irkatalog_files_read Files read\n# TYPE irkatalog_files_read counter\nirkatalog_files_read {}\n\
# HELP irkatalog_files_cataloged Files cataloged\n# TYPE irkatalog_files_cataloged counter\nirkatalog_files_cataloged {}\n\
# HELP irkatalog_metadata_guessed Metadata records guessed\n# TYPE irkatalog_metadata_guessed counter\nirkatalog_metadata_guessed {}\n\
# HELP irkatalog_read_failures Read failures\n# TYPE irkatalog_read_failures counter\nirkatalog_read_failures {}\n\
# HELP irkatalog_uptime_seconds Uptime seconds\n# TYPE irkatalog_uptime_seconds gauge\nirkatalog_uptime_seconds {}\n",
        m.scans_started,
        m.scans_completed,
        m.scans_failed,
        m.files_read,
        m.files_cataloged,
        m.metadata_guessed,
        m.read_failures,
        m.uptime_seconds,
    );
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

// Version/Build info endpoint (JSON)
pub async fn version() -> impl IntoResponse {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "package": {
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "authors": env!("CARGO_PKG_AUTHORS"),
            "license": env!("CARGO_PKG_LICENSE"),
        },
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        }
    });
    (StatusCode::OK, Json(body))
}
