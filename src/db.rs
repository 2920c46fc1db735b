use sqlx::SqlitePool;

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    // Pragmas for better durability/performance; failures are logged but not fatal
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("Failed to set synchronous mode: {}", e);
    }
    // Foreign keys are critical - fail if this doesn't work
    sqlx::query("PRAGMA foreign_keys=ON;").execute(pool).await?;

    if let Err(e) = sqlx::query("PRAGMA busy_timeout=10000;").execute(pool).await {
        tracing::warn!("Failed to set busy_timeout: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA temp_store=MEMORY;").execute(pool).await {
        tracing::warn!("Failed to set temp_store: {}", e);
    }

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS scans (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            root_path TEXT NOT NULL,
            options TEXT NOT NULL,
            started_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
            finished_at TEXT NULL,
            file_count INTEGER NULL,
            cataloged_count INTEGER NULL,
            guessed_count INTEGER NULL,
            warning_count INTEGER NULL
        )"#,
    )
    .execute(pool)
    .await?;

    // Cataloged files of one scan, denormalized metadata for direct filtering
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS scan_files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scan_id TEXT NOT NULL,
            path TEXT NOT NULL,
            name TEXT NOT NULL,
            size INTEGER NULL,
            brand TEXT NOT NULL,
            model TEXT NOT NULL,
            device_type TEXT NOT NULL,
            protocol TEXT NULL,
            is_guessed INTEGER NOT NULL,
            content TEXT NOT NULL,
            FOREIGN KEY(scan_id) REFERENCES scans(id) ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    // Shared catalog, independent of any scan
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS catalog_files (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            brand TEXT NOT NULL,
            model TEXT NOT NULL,
            device_type TEXT NOT NULL,
            protocol TEXT NULL,
            is_guessed INTEGER NOT NULL,
            content TEXT NOT NULL,
            uploaded_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now'))
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_scans_status_started", "CREATE INDEX IF NOT EXISTS idx_scans_status_started ON scans(status, started_at DESC)"),
        ("idx_scan_files_scan", "CREATE INDEX IF NOT EXISTS idx_scan_files_scan ON scan_files(scan_id)"),
        ("idx_scan_files_scan_type", "CREATE INDEX IF NOT EXISTS idx_scan_files_scan_type ON scan_files(scan_id, device_type)"),
        ("idx_scan_files_scan_brand", "CREATE INDEX IF NOT EXISTS idx_scan_files_scan_brand ON scan_files(scan_id, brand)"),
        ("idx_catalog_brand", "CREATE INDEX IF NOT EXISTS idx_catalog_brand ON catalog_files(brand)"),
        ("idx_catalog_model", "CREATE INDEX IF NOT EXISTS idx_catalog_model ON catalog_files(model)"),
        ("idx_catalog_type", "CREATE INDEX IF NOT EXISTS idx_catalog_type ON catalog_files(device_type)"),
        ("idx_catalog_uploaded", "CREATE INDEX IF NOT EXISTS idx_catalog_uploaded ON catalog_files(uploaded_at DESC)"),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            match &e {
                sqlx::Error::Database(db_err) => {
                    let msg = db_err.message().to_lowercase();
                    if msg.contains("already exists") || msg.contains("duplicate") {
                        tracing::debug!("Index {} already exists, skipping", name);
                    } else {
                        tracing::warn!("Failed to create index {}: {}", name, e);
                    }
                }
                _ => {
                    tracing::warn!("Failed to create index {}: {}", name, e);
                }
            }
        }
    }

    Ok(())
}
