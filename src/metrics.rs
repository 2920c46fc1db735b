use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Performance counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub scans_started: Arc<AtomicUsize>,
    pub scans_completed: Arc<AtomicUsize>,
    pub scans_failed: Arc<AtomicUsize>,
    pub files_read: Arc<AtomicU64>,
    pub files_cataloged: Arc<AtomicU64>,
    pub metadata_guessed: Arc<AtomicU64>,
    pub read_failures: Arc<AtomicUsize>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            scans_started: Arc::new(AtomicUsize::new(0)),
            scans_completed: Arc::new(AtomicUsize::new(0)),
            scans_failed: Arc::new(AtomicUsize::new(0)),
            files_read: Arc::new(AtomicU64::new(0)),
            files_cataloged: Arc::new(AtomicU64::new(0)),
            metadata_guessed: Arc::new(AtomicU64::new(0)),
            read_failures: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_scans_started(&self) {
        self.scans_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_scans_completed(&self) {
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_scans_failed(&self) {
        self.scans_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_files_read(&self, count: u64) {
        self.files_read.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_files_cataloged(&self, count: u64) {
        self.files_cataloged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_metadata_guessed(&self, count: u64) {
        self.metadata_guessed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_read_failures(&self, count: usize) {
        self.read_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scans_started: self.scans_started.load(Ordering::Relaxed),
            scans_completed: self.scans_completed.load(Ordering::Relaxed),
            scans_failed: self.scans_failed.load(Ordering::Relaxed),
            files_read: self.files_read.load(Ordering::Relaxed),
            files_cataloged: self.files_cataloged.load(Ordering::Relaxed),
            metadata_guessed: self.metadata_guessed.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub scans_started: usize,
    pub scans_completed: usize,
    pub scans_failed: usize,
    pub files_read: u64,
    pub files_cataloged: u64,
    pub metadata_guessed: u64,
    pub read_failures: usize,
    pub uptime_seconds: u64,
}
