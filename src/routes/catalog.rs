use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::ip::extract_ip_from_headers,
    state::AppState,
    types::{CatalogFileDto, MetadataRecord, ShareFileRequest},
};

/// Metadata fields the catalog can be searched on. Anything else is rejected
/// rather than interpolated into SQL.
const SEARCHABLE_FIELDS: [&str; 3] = ["brand", "model", "device_type"];

fn require_metadata(metadata: &MetadataRecord) -> AppResult<()> {
    for (field, value) in [
        ("brand", &metadata.brand),
        ("model", &metadata.model),
        ("device_type", &metadata.device_type),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::ValidationError {
                field: field.to_string(),
                message: "must not be empty".to_string(),
            });
        }
    }
    Ok(())
}

/// Upload a file with confirmed metadata into the shared catalog.
pub async fn share_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ShareFileRequest>,
) -> AppResult<Response> {
    // Per-endpoint rate limit: "/catalog"
    let ip = extract_ip_from_headers(&headers, None);
    if let Err((status, body)) = state.rate_limiter.check_endpoint_limit("/catalog", ip).await {
        return Ok((status, body).into_response());
    }

    if req.name.trim().is_empty() {
        return Err(AppError::ValidationError {
            field: "name".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if req.content.is_empty() {
        return Err(AppError::ValidationError {
            field: "content".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    require_metadata(&req.metadata)?;

    let id = Uuid::new_v4();
    sqlx::query(
        r#"INSERT INTO catalog_files (id, name, brand, model, device_type, protocol, is_guessed, content)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
    )
    .bind(id.to_string())
    .bind(&req.name)
    .bind(&req.metadata.brand)
    .bind(&req.metadata.model)
    .bind(&req.metadata.device_type)
    .bind(req.metadata.protocol.as_deref())
    .bind(if req.metadata.is_guessed { 1i64 } else { 0i64 })
    .bind(&req.content)
    .execute(&state.db)
    .await?;

    let uploaded_at: String = sqlx::query("SELECT uploaded_at FROM catalog_files WHERE id=?1")
        .bind(id.to_string())
        .fetch_one(&state.db)
        .await
        .map(|row| row.get::<String, _>("uploaded_at"))
        .unwrap_or_else(|_| chrono::Utc::now().to_rfc3339());

    let dto = CatalogFileDto {
        id,
        name: req.name,
        metadata: req.metadata,
        content: None,
        uploaded_at,
    };
    Ok((StatusCode::CREATED, Json(dto)).into_response())
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct SearchQuery {
    /// Metadata field to search on; one of brand, model, device_type.
    pub field: Option<String>,
    /// Case-sensitive value prefix. Empty prefix matches everything.
    pub prefix: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// List or search the shared catalog. Without a field the most recent uploads
/// come first; with one the result is ordered by the searched field.
pub async fn search_catalog(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = q.limit.unwrap_or(200).clamp(1, 5000);
    let offset = q.offset.unwrap_or(0).max(0);

    let rows = match q.field.as_deref() {
        None => {
            sqlx::query(
                "SELECT id, name, brand, model, device_type, protocol, is_guessed, uploaded_at \
                 FROM catalog_files ORDER BY uploaded_at DESC LIMIT ?1 OFFSET ?2",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&state.db)
            .await?
        }
        Some(field) => {
            if !SEARCHABLE_FIELDS.contains(&field) {
                return Err(AppError::InvalidInput(format!(
                    "field must be one of: {}",
                    SEARCHABLE_FIELDS.join(", ")
                )));
            }
            let prefix = q.prefix.clone().unwrap_or_default();
            // Half-open range over the prefix; the upper bound appends the
            // highest code point so every extension of the prefix falls below it.
            let upper = format!("{}{}", prefix, '\u{10ffff}');
            let sql = format!(
                "SELECT id, name, brand, model, device_type, protocol, is_guessed, uploaded_at \
                 FROM catalog_files WHERE {field} >= ?1 AND {field} < ?2 \
                 ORDER BY {field} ASC LIMIT ?3 OFFSET ?4",
            );
            sqlx::query(&sql)
                .bind(prefix)
                .bind(upper)
                .bind(limit)
                .bind(offset)
                .fetch_all(&state.db)
                .await?
        }
    };

    let items: Vec<CatalogFileDto> = rows
        .into_iter()
        .map(|r| CatalogFileDto {
            id: Uuid::parse_str(r.get::<String, _>("id").as_str()).unwrap_or_default(),
            name: r.get::<String, _>("name"),
            metadata: MetadataRecord {
                brand: r.get::<String, _>("brand"),
                model: r.get::<String, _>("model"),
                device_type: r.get::<String, _>("device_type"),
                protocol: r.get::<Option<String>, _>("protocol"),
                is_guessed: r.get::<i64, _>("is_guessed") != 0,
            },
            content: None,
            uploaded_at: r.get::<String, _>("uploaded_at"),
        })
        .collect();

    Ok(Json(items))
}

/// Download one catalog entry including its file content.
pub async fn get_catalog_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let r = sqlx::query(
        "SELECT id, name, brand, model, device_type, protocol, is_guessed, content, uploaded_at \
         FROM catalog_files WHERE id=?1",
    )
    .bind(id.to_string())
    .fetch_optional(&state.db)
    .await?;

    let Some(r) = r else {
        return Err(AppError::NotFound("catalog file not found".into()));
    };

    let dto = CatalogFileDto {
        id,
        name: r.get::<String, _>("name"),
        metadata: MetadataRecord {
            brand: r.get::<String, _>("brand"),
            model: r.get::<String, _>("model"),
            device_type: r.get::<String, _>("device_type"),
            protocol: r.get::<Option<String>, _>("protocol"),
            is_guessed: r.get::<i64, _>("is_guessed") != 0,
        },
        content: Some(r.get::<String, _>("content")),
        uploaded_at: r.get::<String, _>("uploaded_at"),
    };
    Ok(Json(dto))
}
