use std::{collections::HashMap, sync::Arc};

use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::middleware::EndpointRateLimiter;
use crate::storage::Storage;
use crate::types::ScanEvent;

/// A handle to a running scan job. Dropping the sender ends the SSE stream of
/// every subscriber; the handle is removed from the registry when the job
/// finishes.
#[derive(Clone)]
pub struct JobHandle {
    pub sender: broadcast::Sender<ScanEvent>,
}

/// The shared application state, cloned into every handler via Axum's state
/// extraction.
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::SqlitePool,
    /// Running scan jobs keyed by scan id.
    pub jobs: Arc<RwLock<HashMap<Uuid, JobHandle>>>,
    pub config: Arc<AppConfig>,
    pub metrics: Metrics,
    /// The device storage backend all scans and write-backs go through.
    pub storage: Arc<dyn Storage>,
    pub rate_limiter: EndpointRateLimiter,
}

impl AppState {
    pub fn new(db: sqlx::SqlitePool, config: AppConfig, storage: Arc<dyn Storage>) -> Self {
        let rate_limiter = EndpointRateLimiter::new().with_limits(vec![
            ("/scans", 30, 60),    // 30 scan starts per minute
            ("/catalog", 120, 60), // 120 catalog writes/searches per minute
        ]);

        Self {
            db,
            jobs: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
            metrics: Metrics::new(),
            storage,
            rate_limiter,
        }
    }
}
