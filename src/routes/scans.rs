use std::collections::BTreeMap;
use std::time::Duration;

use axum::response::sse::{Event, Sse};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::Stream;
use globset::Glob;
use serde_json::json;
use sqlx::Row;
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    group::{group_by_metadata, CatalogEntry},
    middleware::ip::extract_ip_from_headers,
    middleware::validation::{sanitize_for_logging, validate_device_path, validate_scan_options},
    scanner,
    state::{AppState, JobHandle},
    types::{
        CreateScanRequest, CreateScanResponse, MetadataRecord, ScanEvent, ScanFileDto, ScanOptions,
        ScanSummary,
    },
};

pub async fn create_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateScanRequest>,
) -> AppResult<Response> {
    // Per-endpoint rate limit: "/scans"
    let ip = extract_ip_from_headers(&headers, None);
    if let Err((status, body)) = state.rate_limiter.check_endpoint_limit("/scans", ip).await {
        return Ok((status, body).into_response());
    }

    let d = &state.config.scan_defaults;
    let root_path = req.root_path.clone().unwrap_or_else(|| d.root_path.clone());
    let root_path = validate_device_path(&root_path).map_err(|_| {
        AppError::InvalidInput(format!("Invalid root path: {}", sanitize_for_logging(&root_path)))
    })?;

    validate_scan_options(req.read_concurrency)
        .map_err(|_| AppError::InvalidInput("Invalid scan options".into()))?;

    // Validate exclude patterns early so a bad pattern fails the request, not the scan
    let excludes_src: Vec<String> = req.excludes.clone().unwrap_or_else(|| d.excludes.clone());
    let mut excludes_norm: Vec<String> = Vec::with_capacity(excludes_src.len());
    for pat in excludes_src {
        let norm = pat.trim().to_string();
        if norm.is_empty() {
            continue;
        }
        if let Err(e) = Glob::new(&norm) {
            return Err(AppError::InvalidInput(format!("Invalid exclude pattern: {} ({})", pat, e)));
        }
        excludes_norm.push(norm);
    }

    let options = ScanOptions {
        read_concurrency: req.read_concurrency.unwrap_or(d.read_concurrency),
        excludes: excludes_norm,
    };
    let options_json = serde_json::to_string(&options)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to serialize options: {}", e)))?;

    let id = Uuid::new_v4();
    let (tx, _rx) = broadcast::channel::<ScanEvent>(256);

    state.metrics.inc_scans_started();

    sqlx::query(
        r#"INSERT INTO scans (id, status, root_path, options)
           VALUES (?1, 'running', ?2, ?3)"#,
    )
    .bind(id.to_string())
    .bind(&root_path)
    .bind(options_json)
    .execute(&state.db)
    .await?;

    // Spawn background task
    let db = state.db.clone();
    let storage = state.storage.clone();
    let tx_clone = tx.clone();
    let root_clone = root_path.clone();
    let jobs_map = state.jobs.clone();
    let metrics = state.metrics.clone();

    let _handle: JoinHandle<()> = tokio::spawn(async move {
        let res = scanner::run_scan(
            db.clone(),
            id,
            storage,
            root_clone,
            options,
            tx_clone.clone(),
        )
        .await;
        match res {
            Ok(stats) => {
                metrics.inc_scans_completed();
                metrics.add_files_read(stats.files_seen);
                metrics.add_files_cataloged(stats.files_cataloged);
                metrics.add_metadata_guessed(stats.files_guessed);
                metrics.add_read_failures(stats.warnings as usize);
                let _ = tx_clone.send(ScanEvent::Done {
                    file_count: stats.files_seen,
                    cataloged_count: stats.files_cataloged,
                    guessed_count: stats.files_guessed,
                    warning_count: stats.warnings,
                });
                let _ = sqlx::query(
                    r#"UPDATE scans SET status='done', finished_at = strftime('%Y-%m-%dT%H:%M:%SZ','now') WHERE id=?1"#,
                )
                .bind(id.to_string())
                .execute(&db)
                .await;
            }
            Err(e) => {
                metrics.inc_scans_failed();
                let _ = tx_clone.send(ScanEvent::Failed { message: format!("{}", e) });
                let _ = sqlx::query(
                    r#"UPDATE scans SET status='failed', finished_at = strftime('%Y-%m-%dT%H:%M:%SZ','now') WHERE id=?1"#,
                )
                .bind(id.to_string())
                .execute(&db)
                .await;
            }
        }
        // Always remove job handle after completion
        {
            let mut jobs = jobs_map.write().await;
            jobs.remove(&id);
        }
    });

    // Register job
    {
        let mut jobs = state.jobs.write().await;
        jobs.insert(id, JobHandle { sender: tx.clone() });
    }

    let _ = tx.send(ScanEvent::Started { root_path: root_path.clone() });

    // Read back ISO UTC started_at from DB for response
    let started_at_iso: String = sqlx::query("SELECT started_at FROM scans WHERE id=?1")
        .bind(id.to_string())
        .fetch_one(&state.db)
        .await
        .map(|row| row.get::<String, _>("started_at"))
        .unwrap_or_else(|_| chrono::Utc::now().to_rfc3339());
    let resp = CreateScanResponse { id, status: "running".into(), started_at: started_at_iso };
    Ok((StatusCode::ACCEPTED, Json(resp)).into_response())
}

fn summary_from_row(r: &sqlx::sqlite::SqliteRow) -> ScanSummary {
    ScanSummary {
        id: Uuid::parse_str(r.get::<String, _>("id").as_str()).unwrap_or_default(),
        status: r.get::<String, _>("status"),
        root_path: r.get::<String, _>("root_path"),
        started_at: r.get::<Option<String>, _>("started_at"),
        finished_at: r.get::<Option<String>, _>("finished_at"),
        file_count: r.get::<i64, _>("file_count"),
        cataloged_count: r.get::<i64, _>("cataloged_count"),
        guessed_count: r.get::<i64, _>("guessed_count"),
        warning_count: r.get::<i64, _>("warning_count"),
    }
}

const SCAN_SUMMARY_COLUMNS: &str = r#"id, status, root_path, started_at, finished_at,
    COALESCE(file_count,0) AS file_count,
    COALESCE(cataloged_count,0) AS cataloged_count,
    COALESCE(guessed_count,0) AS guessed_count,
    COALESCE(warning_count,0) AS warning_count"#;

pub async fn list_scans(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let sql = format!("SELECT {} FROM scans ORDER BY started_at DESC", SCAN_SUMMARY_COLUMNS);
    let rows = sqlx::query(&sql).fetch_all(&state.db).await?;
    let items: Vec<ScanSummary> = rows.iter().map(summary_from_row).collect();
    Ok(Json(items))
}

pub async fn get_scan(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<impl IntoResponse> {
    let sql = format!("SELECT {} FROM scans WHERE id = ?1", SCAN_SUMMARY_COLUMNS);
    let r = sqlx::query(&sql).bind(id.to_string()).fetch_optional(&state.db).await?;

    match r {
        Some(r) => Ok(Json(summary_from_row(&r))),
        None => Err(AppError::NotFound("scan not found".into())),
    }
}

pub async fn scan_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>>> {
    let rx = {
        let jobs = state.jobs.read().await;
        if let Some(handle) = jobs.get(&id) {
            handle.sender.subscribe()
        } else {
            return Err(AppError::NotFound("scan not running".into()));
        }
    };

    let stream = BroadcastStream::new(rx).filter_map(|res| res.ok()).map(|ev| {
        let data = serde_json::to_string(&ev)
            .unwrap_or_else(|_| json!({"type":"warning","message":"serialization error"}).to_string());
        Ok::<Event, std::convert::Infallible>(Event::default().data(data))
    });

    Ok(Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new().interval(Duration::from_secs(10)).text("keep-alive"),
    ))
}

// ---------------------- FILES ENDPOINT ----------------------

#[derive(Debug, Default, serde::Deserialize)]
pub struct FilesQuery {
    pub device_type: Option<String>,
    pub brand: Option<String>,
    pub guessed: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn get_files(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<FilesQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = q.limit.unwrap_or(500).clamp(1, 5000);
    let offset = q.offset.unwrap_or(0).max(0);

    let mut sql = String::from(
        "SELECT path, name, size, brand, model, device_type, protocol, is_guessed \
         FROM scan_files WHERE scan_id=?1",
    );
    let mut idx = 2;
    if q.device_type.is_some() {
        sql.push_str(&format!(" AND device_type = ?{}", idx));
        idx += 1;
    }
    if q.brand.is_some() {
        sql.push_str(&format!(" AND brand = ?{}", idx));
        idx += 1;
    }
    if q.guessed.is_some() {
        sql.push_str(&format!(" AND is_guessed = ?{}", idx));
        idx += 1;
    }
    // rowid order = insertion order = walk emission order
    sql.push_str(&format!(" ORDER BY id ASC LIMIT ?{} OFFSET ?{}", idx, idx + 1));

    let mut qx = sqlx::query(&sql).bind(id.to_string());
    if let Some(ref dt) = q.device_type {
        qx = qx.bind(dt);
    }
    if let Some(ref b) = q.brand {
        qx = qx.bind(b);
    }
    if let Some(g) = q.guessed {
        qx = qx.bind(if g { 1i64 } else { 0i64 });
    }
    qx = qx.bind(limit).bind(offset);

    let rows = qx.fetch_all(&state.db).await?;
    let items: Vec<ScanFileDto> = rows
        .into_iter()
        .map(|r| ScanFileDto {
            path: r.get::<String, _>("path"),
            name: r.get::<String, _>("name"),
            size: r.get::<Option<i64>, _>("size"),
            metadata: MetadataRecord {
                brand: r.get::<String, _>("brand"),
                model: r.get::<String, _>("model"),
                device_type: r.get::<String, _>("device_type"),
                protocol: r.get::<Option<String>, _>("protocol"),
                is_guessed: r.get::<i64, _>("is_guessed") != 0,
            },
        })
        .collect();

    Ok(Json(items))
}

// ---------------------- GROUPS ENDPOINT ----------------------

#[derive(Debug, serde::Serialize)]
struct GroupItem {
    name: String,
    path: Option<String>,
    metadata: Option<MetadataRecord>,
}

fn to_items(entries: &[&CatalogEntry]) -> Vec<GroupItem> {
    entries
        .iter()
        .map(|e| GroupItem { name: e.name.clone(), path: e.path.clone(), metadata: e.metadata.clone() })
        .collect()
}

/// Grouped views over the cataloged files of one scan: by device category and
/// by brand, plus the flat list.
pub async fn get_groups(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let exists = sqlx::query("SELECT 1 FROM scans WHERE id=?1")
        .bind(id.to_string())
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("scan not found".into()));
    }

    let rows = sqlx::query(
        "SELECT path, name, brand, model, device_type, protocol, is_guessed, content \
         FROM scan_files WHERE scan_id=?1 ORDER BY id ASC",
    )
    .bind(id.to_string())
    .fetch_all(&state.db)
    .await?;

    let entries: Vec<CatalogEntry> = rows
        .into_iter()
        .map(|r| CatalogEntry {
            name: r.get::<String, _>("name"),
            path: Some(r.get::<String, _>("path")),
            metadata: Some(MetadataRecord {
                brand: r.get::<String, _>("brand"),
                model: r.get::<String, _>("model"),
                device_type: r.get::<String, _>("device_type"),
                protocol: r.get::<Option<String>, _>("protocol"),
                is_guessed: r.get::<i64, _>("is_guessed") != 0,
            }),
            content: r.get::<String, _>("content"),
        })
        .collect();

    let grouped = group_by_metadata(&entries);
    let by_device_type: BTreeMap<&str, Vec<GroupItem>> =
        grouped.by_device_type.iter().map(|(k, v)| (*k, to_items(v))).collect();
    let by_brand: BTreeMap<&str, Vec<GroupItem>> =
        grouped.by_brand.iter().map(|(k, v)| (*k, to_items(v))).collect();

    Ok(Json(json!({
        "by_device_type": by_device_type,
        "by_brand": by_brand,
        "all": to_items(&grouped.all),
    })))
}
