use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: String,
}

/// Incremental upload progress. `percent` is rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub percent: f64,
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn new(loaded: u64, total: u64) -> Self {
        let percent = if total == 0 || loaded >= total {
            100.0
        } else {
            (loaded as f64 / total as f64 * 10_000.0).round() / 100.0
        };
        Self {
            percent,
            loaded,
            total,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }
}

/// Result of a successful put: where the object landed and its content tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub location: String,
    pub etag: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadReceipt {
    pub key: String,
    pub output_path: PathBuf,
    pub bytes: u64,
}

// ── Envelope payloads ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileList {
    pub files: Vec<ObjectRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Uploaded {
    pub data: UploadReceipt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Downloaded {
    pub data: DownloadReceipt,
}
