use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    metadata,
    middleware::validation::{sanitize_for_logging, validate_device_path},
    state::AppState,
    types::{ConfirmMetadataRequest, MetadataRecord},
};

/// Confirm guessed metadata by writing it into the file's header block.
///
/// The file is read back from the device, the metadata comment lines are
/// inserted after its `Version:` line, and the result is written in place.
/// A subsequent scan then classifies the file from its header.
pub async fn confirm_metadata(
    State(state): State<AppState>,
    Json(req): Json<ConfirmMetadataRequest>,
) -> AppResult<impl IntoResponse> {
    let path = validate_device_path(&req.path).map_err(|_| {
        AppError::InvalidInput(format!("Invalid path: {}", sanitize_for_logging(&req.path)))
    })?;
    if !path.ends_with(".ir") {
        return Err(AppError::InvalidInput("path does not name a device-control file".into()));
    }

    for (field, value) in [
        ("brand", &req.metadata.brand),
        ("model", &req.metadata.model),
        ("device_type", &req.metadata.device_type),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::ValidationError {
                field: field.to_string(),
                message: "must not be empty".to_string(),
            });
        }
    }

    let content = state.storage.read_file(&path).await?;
    if metadata::parse_header(&content).is_some() {
        return Err(AppError::BadRequest("file already carries a complete metadata header".into()));
    }

    let rewritten = metadata::insert_header(&content, &req.metadata);
    state.storage.write_file(&path, &rewritten).await?;
    tracing::info!(path, brand = %req.metadata.brand, model = %req.metadata.model, "metadata confirmed");

    let confirmed = MetadataRecord { is_guessed: false, ..req.metadata };
    Ok(Json(json!({ "path": path, "metadata": confirmed })))
}
