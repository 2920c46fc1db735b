use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One node of the device storage hierarchy, as reported by a directory
/// listing. Snapshot only; the scanner never writes through this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Name including extension, e.g. `SAMSUNG_UE55NU7100.ir`.
    pub name: String,
    /// Absolute device path, forward-slash separated, e.g. `/ext/infrared/TVS/x.ir`.
    pub path: String,
    pub is_directory: bool,
    pub size: Option<u64>,
}

/// Identity of a device-control file. Brand, model and device type are always
/// populated together; extraction yields either a complete record or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub brand: String,
    pub model: String,
    pub device_type: String,
    /// Present only when the source header supplied a `# Protocol:` line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// True when the record came from the name guesser rather than the header.
    #[serde(default)]
    pub is_guessed: bool,
}

/// Unit of scanner output: a candidate file, its derived metadata and the raw
/// content that was read to obtain it. Ownership moves to the caller.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub entry: FileEntry,
    pub metadata: MetadataRecord,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Cap on simultaneous reads within one directory. Groups of this size are
    /// awaited in full before the next group is issued.
    pub read_concurrency: usize,
    pub excludes: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { read_concurrency: 3, excludes: vec![] }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScanRequest {
    pub root_path: Option<String>,
    pub excludes: Option<Vec<String>>,
    pub read_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScanResponse {
    pub id: Uuid,
    pub status: String,
    pub started_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub id: Uuid,
    pub status: String,
    pub root_path: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    /// Candidate `.ir` files encountered during the walk.
    pub file_count: i64,
    /// Files that yielded a complete metadata record.
    pub cataloged_count: i64,
    /// Subset of cataloged files whose metadata was guessed from the name.
    pub guessed_count: i64,
    pub warning_count: i64,
}

/// Row shape of a cataloged file within one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFileDto {
    pub path: String,
    pub name: String,
    pub size: Option<i64>,
    pub metadata: MetadataRecord,
}

/// Row shape of a shared catalog entry. Content is elided in listings and only
/// returned by the download endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFileDto {
    pub id: Uuid,
    pub name: String,
    pub metadata: MetadataRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareFileRequest {
    pub name: String,
    pub metadata: MetadataRecord,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmMetadataRequest {
    /// Device path of the file whose header should receive the metadata.
    pub path: String,
    pub metadata: MetadataRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    Started {
        root_path: String,
    },
    Progress {
        current_path: String,
        dirs_scanned: u64,
        files_seen: u64,
        files_cataloged: u64,
    },
    Warning {
        path: String,
        code: String,
        message: String,
    },
    Done {
        file_count: u64,
        cataloged_count: u64,
        guessed_count: u64,
        warning_count: u64,
    },
    Failed {
        message: String,
    },
}
