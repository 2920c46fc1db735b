//! Depth-first walk of the device hierarchy.
//!
//! Directories are traversed one at a time; only the file reads inside a
//! directory run concurrently, in fixed groups of `read_concurrency`. A group
//! is awaited in full before the next one is issued, which keeps the load on
//! the slow transport bounded and predictable. Single-file failures are
//! reported as warnings and never abort the walk.

use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use globset::{Glob, GlobSet, GlobSetBuilder};
use sqlx::QueryBuilder;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::metadata;
use crate::storage::Storage;
use crate::types::{FileEntry, ScanEvent, ScanOptions, ScannedFile};

/// Directory segment that marks curated library content. Files below it carry
/// no naming convention we can trust, so the guesser stays off there.
const RESERVED_SEGMENT: &str = "IRDB";

#[derive(Debug, Default, Clone)]
pub struct ScanStats {
    pub dirs_scanned: u64,
    /// Candidate `.ir` files encountered, readable or not.
    pub files_seen: u64,
    /// Files that yielded a complete metadata record.
    pub files_cataloged: u64,
    /// Subset of cataloged files classified by the name guesser.
    pub files_guessed: u64,
    pub warnings: u64,
}

struct Walker<'a> {
    storage: &'a dyn Storage,
    excludes: GlobSet,
    read_concurrency: usize,
    tx: Option<&'a broadcast::Sender<ScanEvent>>,
}

impl<'a> Walker<'a> {
    fn send(&self, event: ScanEvent) {
        if let Some(tx) = self.tx {
            let _ = tx.send(event);
        }
    }

    fn warn(&self, stats: &mut ScanStats, path: &str, code: &str, message: &str) {
        stats.warnings += 1;
        tracing::warn!(path, code, "{}", message);
        self.send(ScanEvent::Warning {
            path: path.to_string(),
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    /// Recursion is boxed because async fns cannot refer to themselves.
    /// Subdirectories are entered strictly after the current directory's file
    /// groups have completed, and one subtree at a time.
    fn walk_dir<'b>(
        &'b self,
        dir: String,
        guessing_enabled: bool,
        stats: &'b mut ScanStats,
        out: &'b mut Vec<ScannedFile>,
    ) -> BoxFuture<'b, ()> {
        async move {
            let entries = match self.storage.list_directory(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    self.warn(stats, &dir, "list_failed", &e.to_string());
                    return;
                }
            };
            self.walk_entries(dir, entries, guessing_enabled, stats, out).await;
        }
        .boxed()
    }

    /// Processes an already-listed directory. Split from [`walk_dir`] so the
    /// root listing that validated the scan is not issued a second time.
    fn walk_entries<'b>(
        &'b self,
        dir: String,
        entries: Vec<FileEntry>,
        guessing_enabled: bool,
        stats: &'b mut ScanStats,
        out: &'b mut Vec<ScannedFile>,
    ) -> BoxFuture<'b, ()> {
        async move {
            stats.dirs_scanned += 1;

            let mut candidates: Vec<FileEntry> = Vec::new();
            let mut subdirs: Vec<FileEntry> = Vec::new();
            for entry in entries {
                if entry.name.starts_with('.') || self.excludes.is_match(&entry.path) {
                    continue;
                }
                if entry.is_directory {
                    subdirs.push(entry);
                } else if entry.name.ends_with(".ir") {
                    candidates.push(entry);
                }
            }

            for group in candidates.chunks(self.read_concurrency.max(1)) {
                let reads = group.iter().map(|entry| self.storage.read_file(&entry.path));
                let results = join_all(reads).await;
                for (entry, result) in group.iter().zip(results) {
                    stats.files_seen += 1;
                    let content = match result {
                        Ok(content) => content,
                        Err(e) => {
                            self.warn(stats, &entry.path, "read_failed", &e.to_string());
                            continue;
                        }
                    };
                    let Some(record) = classify(entry, &content, guessing_enabled) else {
                        continue;
                    };
                    stats.files_cataloged += 1;
                    if record.is_guessed {
                        stats.files_guessed += 1;
                    }
                    out.push(ScannedFile { entry: entry.clone(), metadata: record, content });
                }
            }

            self.send(ScanEvent::Progress {
                current_path: dir,
                dirs_scanned: stats.dirs_scanned,
                files_seen: stats.files_seen,
                files_cataloged: stats.files_cataloged,
            });

            for sub in subdirs {
                let child_guessing =
                    guessing_enabled && !sub.name.eq_ignore_ascii_case(RESERVED_SEGMENT);
                self.walk_dir(sub.path, child_guessing, stats, out).await;
            }
        }
        .boxed()
    }
}

/// Header first; the guesser only runs when the header is absent or
/// incomplete, and never below a reserved segment.
fn classify(
    entry: &FileEntry,
    content: &str,
    guessing_enabled: bool,
) -> Option<crate::types::MetadataRecord> {
    if let Some(record) = metadata::parse_header(content) {
        return Some(record);
    }
    if !guessing_enabled {
        return None;
    }
    let segments: Vec<String> = entry
        .path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    // Last segment is the filename, not a directory.
    let dir_segments = &segments[..segments.len().saturating_sub(1)];
    metadata::guess_metadata(&entry.name, dir_segments)
}

/// Walk the tree below `root` and return every classifiable file together
/// with the walk statistics. Fails only when the root itself cannot be
/// listed; everything below it degrades to warnings.
pub async fn scan_tree(
    storage: &dyn Storage,
    root: &str,
    options: &ScanOptions,
    tx: Option<&broadcast::Sender<ScanEvent>>,
) -> anyhow::Result<(Vec<ScannedFile>, ScanStats)> {
    let root_entries = storage
        .list_directory(root)
        .await
        .map_err(|e| anyhow::anyhow!("root path {} is not listable: {}", root, e))?;

    let walker = Walker {
        storage,
        excludes: build_globset(&options.excludes)?,
        read_concurrency: options.read_concurrency,
        tx,
    };

    let mut stats = ScanStats::default();
    let mut out = Vec::new();
    let root_guessing = !root
        .split('/')
        .any(|seg| seg.eq_ignore_ascii_case(RESERVED_SEGMENT));
    walker.walk_entries(root.to_string(), root_entries, root_guessing, &mut stats, &mut out).await;
    Ok((out, stats))
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut b = GlobSetBuilder::new();
    for p in patterns {
        let norm = p.trim();
        if norm.is_empty() {
            continue;
        }
        b.add(Glob::new(norm)?);
    }
    Ok(b.build()?)
}

/// Execute a scan end to end: walk the tree, persist the cataloged files and
/// update the scan row. Event emission (`Started`/`Done`/`Failed`) and status
/// transitions on failure are handled by the caller.
pub async fn run_scan(
    pool: sqlx::SqlitePool,
    id: Uuid,
    storage: Arc<dyn Storage>,
    root: String,
    options: ScanOptions,
    tx: broadcast::Sender<ScanEvent>,
) -> anyhow::Result<ScanStats> {
    let (files, stats) = scan_tree(storage.as_ref(), &root, &options, Some(&tx)).await?;
    persist_files(&pool, id, &files).await?;

    sqlx::query(
        r#"UPDATE scans SET
            file_count=?1, cataloged_count=?2, guessed_count=?3, warning_count=?4
           WHERE id=?5"#,
    )
    .bind(stats.files_seen as i64)
    .bind(stats.files_cataloged as i64)
    .bind(stats.files_guessed as i64)
    .bind(stats.warnings as i64)
    .bind(id.to_string())
    .execute(&pool)
    .await?;

    Ok(stats)
}

async fn persist_files(
    pool: &sqlx::SqlitePool,
    id: Uuid,
    files: &[ScannedFile],
) -> anyhow::Result<()> {
    if files.is_empty() {
        return Ok(());
    }
    let sid = id.to_string();
    let mut txdb = pool.begin().await?;

    // SQLite caps bound variables per statement (commonly 999); chunk rows so
    // a single INSERT stays below it.
    const SQLITE_MAX_VARS: usize = 999;
    const BINDS_PER_ROW: usize = 10;

    for chunk in files.chunks(SQLITE_MAX_VARS / BINDS_PER_ROW) {
        let mut qb = QueryBuilder::new(
            "INSERT INTO scan_files (scan_id, path, name, size, brand, model, device_type, protocol, is_guessed, content) "
        );
        qb.push_values(chunk, |mut b, f| {
            b.push_bind(&sid)
                .push_bind(&f.entry.path)
                .push_bind(&f.entry.name)
                .push_bind(f.entry.size.map(|s| s as i64))
                .push_bind(&f.metadata.brand)
                .push_bind(&f.metadata.model)
                .push_bind(&f.metadata.device_type)
                .push_bind(f.metadata.protocol.as_deref())
                .push_bind(if f.metadata.is_guessed { 1i64 } else { 0i64 })
                .push_bind(&f.content);
        });
        qb.build().execute(&mut *txdb).await?;
    }

    txdb.commit().await?;
    Ok(())
}
