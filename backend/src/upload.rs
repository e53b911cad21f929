//! Media upload orchestration: per-file validation, concurrent uploads
//! to blob storage, and input-order reconciliation of persisted URLs.
//!
//! Each file in a batch settles independently; one rejected or failed
//! file never blocks its siblings.

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_IMAGES_PER_LISTING: usize = 20;
pub const MAX_FLOORPLANS_PER_LISTING: usize = 5;

const IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg"];
const FLOORPLAN_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg", "application/pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    Images,
    Floorplans,
}

impl UploadCategory {
    pub fn max_count(self) -> usize {
        match self {
            UploadCategory::Images => MAX_IMAGES_PER_LISTING,
            UploadCategory::Floorplans => MAX_FLOORPLANS_PER_LISTING,
        }
    }

    pub fn allowed_types(self) -> &'static [&'static str] {
        match self {
            UploadCategory::Images => IMAGE_TYPES,
            UploadCategory::Floorplans => FLOORPLAN_TYPES,
        }
    }

    fn folder(self) -> &'static str {
        match self {
            UploadCategory::Images => "images",
            UploadCategory::Floorplans => "floorplans",
        }
    }
}

/// A file selected by the user but not yet persisted.
#[derive(Debug, Clone)]
pub struct FileHandle {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A persisted file: the original handle name paired with its URL in
/// one record, so removal drops both together.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{content_type} files are not accepted here")]
    UnsupportedType { content_type: String },
    #[error("file is {size} bytes, over the {MAX_FILE_BYTES} byte limit")]
    TooLarge { size: usize },
    #[error("no more than {limit} files are allowed")]
    LimitExceeded { limit: usize },
    #[error("upload failed: {0}")]
    Storage(#[from] StorageError),
}

/// User-facing rejection for one file in a batch.
#[derive(Debug)]
pub struct UploadRejection {
    pub file_name: String,
    pub reason: UploadError,
}

#[derive(Debug, Default)]
pub struct UploadOutcome {
    /// Successful uploads, in the order the files were given.
    pub uploaded: Vec<MediaItem>,
    pub rejected: Vec<UploadRejection>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob storage unavailable: {0}")]
    Unavailable(String),
}

/// Upload-and-get-URL interface over the managed blob store.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, data: &[u8]) -> Result<String, StorageError>;
}

fn validate(category: UploadCategory, file: &FileHandle) -> Result<(), UploadError> {
    let content_type = file.content_type.to_lowercase();
    if !category.allowed_types().contains(&content_type.as_str()) {
        return Err(UploadError::UnsupportedType {
            content_type: file.content_type.clone(),
        });
    }
    if file.data.len() > MAX_FILE_BYTES {
        return Err(UploadError::TooLarge {
            size: file.data.len(),
        });
    }
    Ok(())
}

/// Validates and uploads a batch of files for one category. `existing`
/// is how many files the listing already holds in that category, which
/// counts against the per-listing ceiling.
///
/// Valid files upload concurrently and settle independently; `uploaded`
/// comes back in input order regardless of completion order.
pub async fn upload_batch(
    storage: &dyn ObjectStorage,
    category: UploadCategory,
    existing: usize,
    files: Vec<FileHandle>,
) -> UploadOutcome {
    let mut outcome = UploadOutcome::default();
    let mut accepted = Vec::new();
    let mut slots = existing;
    for file in files {
        if let Err(reason) = validate(category, &file) {
            warn!(file = %file.name, %reason, "rejecting file from upload batch");
            outcome.rejected.push(UploadRejection {
                file_name: file.name,
                reason,
            });
            continue;
        }
        if slots >= category.max_count() {
            outcome.rejected.push(UploadRejection {
                file_name: file.name,
                reason: UploadError::LimitExceeded {
                    limit: category.max_count(),
                },
            });
            continue;
        }
        slots += 1;
        accepted.push(file);
    }

    let uploads = accepted.iter().map(|file| {
        let key = format!("{}/{}", category.folder(), Uuid::new_v4());
        async move { storage.put(&key, &file.content_type, &file.data).await }
    });
    // join_all yields results in future order, which restores input
    // order even when the uploads themselves finish out of order.
    let results = join_all(uploads).await;

    for (file, result) in accepted.into_iter().zip(results) {
        match result {
            Ok(url) => outcome.uploaded.push(MediaItem {
                file_name: file.name,
                url,
            }),
            Err(e) => {
                warn!(file = %file.name, error = %e, "upload failed");
                outcome.rejected.push(UploadRejection {
                    file_name: file.name,
                    reason: UploadError::Storage(e),
                });
            }
        }
    }
    outcome
}

/// In-memory blob store stand-in; returns a synthetic URL per object.
#[derive(Default)]
pub struct MemoryStorage;

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(
        &self,
        key: &str,
        _content_type: &str,
        _data: &[u8],
    ) -> Result<String, StorageError> {
        Ok(format!("https://storage.example/{key}"))
    }
}
