//! Shared fixtures: an in-memory storage backend, an in-memory database and a
//! fully wired router.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::routing::{get, post};
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::middleware::EndpointRateLimiter;
use crate::routes;
use crate::state::AppState;
use crate::storage::{Storage, StorageError};
use crate::types::FileEntry;

/// In-memory device tree. Directory listings are derived from the registered
/// file paths; reads can be delayed or forced to fail per path.
pub struct MockStorage {
    dirs: HashMap<String, Vec<FileEntry>>,
    files: Mutex<HashMap<String, String>>,
    failing: HashSet<String>,
    read_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// `start <path>` / `end <path>` markers in observed order.
    pub events: Mutex<Vec<String>>,
    /// Paths passed to `list_directory`, in call order.
    pub listed: Mutex<Vec<String>>,
}

impl MockStorage {
    pub fn new() -> Self {
        let mut dirs = HashMap::new();
        dirs.insert("/".to_string(), Vec::new());
        Self {
            dirs,
            files: Mutex::new(HashMap::new()),
            failing: HashSet::new(),
            read_delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
            listed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    fn register_entry(&mut self, parent: &str, entry: FileEntry) {
        let children = self.dirs.entry(parent.to_string()).or_default();
        if !children.iter().any(|e| e.path == entry.path) {
            children.push(entry);
        }
    }

    /// Create all ancestor directories of `path` and link them up.
    fn ensure_parents(&mut self, path: &str) -> String {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut parent = String::from("/");
        for seg in &segments[..segments.len() - 1] {
            let dir_path = if parent == "/" {
                format!("/{}", seg)
            } else {
                format!("{}/{}", parent, seg)
            };
            self.dirs.entry(dir_path.clone()).or_default();
            let entry = FileEntry {
                name: seg.to_string(),
                path: dir_path.clone(),
                is_directory: true,
                size: None,
            };
            self.register_entry(&parent, entry);
            parent = dir_path;
        }
        parent
    }

    pub fn add_dir(&mut self, path: &str) {
        self.ensure_parents(&format!("{}/x", path.trim_end_matches('/')));
    }

    pub fn add_file(&mut self, path: &str, content: &str) {
        let parent = self.ensure_parents(path);
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.register_entry(
            &parent,
            FileEntry {
                name,
                path: path.to_string(),
                is_directory: false,
                size: Some(content.len() as u64),
            },
        );
        self.files.lock().unwrap().insert(path.to_string(), content.to_string());
    }

    /// Register a file whose reads always fail.
    pub fn fail_read(&mut self, path: &str) {
        self.add_file(path, "");
        self.failing.insert(path.to_string());
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn content_of(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn list_directory(&self, path: &str) -> Result<Vec<FileEntry>, StorageError> {
        self.listed.lock().unwrap().push(path.to_string());
        self.dirs
            .get(path.trim_end_matches('/'))
            .or_else(|| self.dirs.get(path))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn read_file(&self, path: &str) -> Result<String, StorageError> {
        if self.failing.contains(path) {
            return Err(StorageError::Unavailable(format!("injected failure: {}", path)));
        }
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("start {}", path));

        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }

        let result = self
            .files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()));
        self.events.lock().unwrap().push(format!("end {}", path));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), StorageError> {
        self.files.lock().unwrap().insert(path.to_string(), content.to_string());
        Ok(())
    }
}

pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    crate::db::init_db(&pool).await.unwrap();
    pool
}

pub async fn test_state(storage: Arc<dyn Storage>) -> AppState {
    AppState {
        db: test_pool().await,
        jobs: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
        config: Arc::new(AppConfig::default()),
        metrics: crate::metrics::Metrics::new(),
        storage,
        rate_limiter: EndpointRateLimiter::new(),
    }
}

pub fn test_app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::health::healthz))
        .route("/readyz", get(routes::health::readyz))
        .route("/metrics", get(routes::health::metrics))
        .route("/metrics/prometheus", get(routes::health::metrics_prometheus))
        .route("/version", get(routes::health::version))
        .route("/scans", post(routes::scans::create_scan).get(routes::scans::list_scans))
        .route("/scans/{id}", get(routes::scans::get_scan))
        .route("/scans/{id}/events", get(routes::scans::scan_events))
        .route("/scans/{id}/files", get(routes::scans::get_files))
        .route("/scans/{id}/groups", get(routes::scans::get_groups))
        .route("/catalog", post(routes::catalog::share_file).get(routes::catalog::search_catalog))
        .route("/catalog/{id}", get(routes::catalog::get_catalog_file))
        .route("/files/confirm", post(routes::files::confirm_metadata))
        .with_state(state)
}

/// A complete control file with a full metadata header.
pub fn ir_file_with_header(brand: &str, model: &str, device_type: &str) -> String {
    format!(
        "Filetype: IR signals file\nVersion: 1\n# Brand: {}\n# Device Type: {}\n# Protocol: NECext\n# Model: {}\nname: POWER\ntype: parsed\nprotocol: NECext\n",
        brand, device_type, model
    )
}

/// A control file without any metadata header lines.
pub fn ir_file_bare() -> String {
    "Filetype: IR signals file\nVersion: 1\nname: POWER\ntype: parsed\nprotocol: NEC\n".to_string()
}
