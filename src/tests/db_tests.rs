use super::support::test_pool;

#[tokio::test]
async fn init_creates_the_schema() {
    let pool = test_pool().await;

    for table in ["scans", "scan_files", "catalog_files"] {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "missing table {}", table);
    }
}

#[tokio::test]
async fn init_is_idempotent() {
    let pool = test_pool().await;
    crate::db::init_db(&pool).await.unwrap();
    crate::db::init_db(&pool).await.unwrap();
}

#[tokio::test]
async fn deleting_a_scan_cascades_to_its_files() {
    let pool = test_pool().await;

    sqlx::query("INSERT INTO scans (id, status, root_path, options) VALUES ('s1', 'done', '/ext/infrared', '{}')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO scan_files (scan_id, path, name, brand, model, device_type, is_guessed, content)
         VALUES ('s1', '/ext/infrared/TVS/a.ir', 'a.ir', 'SONY', 'RM839', 'TV', 0, '')",
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query("DELETE FROM scans WHERE id='s1'").execute(&pool).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scan_files WHERE scan_id='s1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn timestamps_use_iso_utc_defaults() {
    let pool = test_pool().await;

    sqlx::query("INSERT INTO scans (id, status, root_path, options) VALUES ('s1', 'running', '/ext/infrared', '{}')")
        .execute(&pool)
        .await
        .unwrap();
    let started_at: String = sqlx::query_scalar("SELECT started_at FROM scans WHERE id='s1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(started_at.ends_with('Z'));
    assert!(started_at.contains('T'));
}
