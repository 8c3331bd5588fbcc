//! Presence probe backed by an on-disk image index.
//!
//! Reads the `index.json` kept next to a local image store:
//!
//! ```json
//! { "images": [ { "reference": "localhost/acme/db:1", "digest": "sha256:...",
//!                 "size_bytes": 1024, "pulled_at": "...", "last_used": "...",
//!                 "path": "/var/lib/images/sha256/..." } ] }
//! ```
//!
//! The index is only read. An entry counts as present when its image
//! layout directory still exists.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use imagesmith_core::error::{ImageError, Result};
use serde::{Deserialize, Serialize};

use super::PresenceProbe;
use crate::oci::ImageReference;

/// Index file name inside the store directory.
const INDEX_FILE: &str = "index.json";

/// One image recorded in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedImage {
    /// Image reference string (e.g., "localhost/openliberty/testcontainers/postgres:17-alpine")
    pub reference: String,
    /// Content digest (e.g., "sha256:abc123...")
    pub digest: String,
    /// Total size in bytes
    pub size_bytes: u64,
    /// When the image was pulled
    pub pulled_at: DateTime<Utc>,
    /// When the image was last used
    pub last_used: DateTime<Utc>,
    /// Path to the image layout on disk
    pub path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreIndex {
    images: Vec<IndexedImage>,
}

/// Looks references up in `<store_dir>/index.json`.
#[derive(Debug, Clone)]
pub struct LocalIndexProbe {
    store_dir: PathBuf,
}

impl LocalIndexProbe {
    pub fn new(store_dir: &Path) -> Self {
        Self {
            store_dir: store_dir.to_path_buf(),
        }
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// All entries currently in the index. A missing index is empty.
    pub async fn list(&self) -> Result<Vec<IndexedImage>> {
        let index_path = self.store_dir.join(INDEX_FILE);
        let data = match tokio::fs::read_to_string(&index_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ImageError::io(&index_path, e)),
        };

        let index: StoreIndex = serde_json::from_str(&data).map_err(|e| {
            ImageError::Serialization(format!(
                "Failed to parse image index {}: {}",
                index_path.display(),
                e
            ))
        })?;
        Ok(index.images)
    }
}

#[async_trait]
impl PresenceProbe for LocalIndexProbe {
    async fn is_present(&self, reference: &ImageReference) -> Result<bool> {
        let wanted = reference.canonical_name();
        let images = self.list().await?;

        let entry = images.iter().find(|image| {
            image.reference == wanted
                || ImageReference::parse(&image.reference)
                    .map(|parsed| parsed == *reference)
                    .unwrap_or(false)
        });

        match entry {
            Some(image) => {
                let exists = tokio::fs::metadata(&image.path)
                    .await
                    .map(|m| m.is_dir())
                    .unwrap_or(false);
                if !exists {
                    tracing::debug!(
                        reference = %wanted,
                        path = %image.path.display(),
                        "Indexed image layout is missing"
                    );
                }
                Ok(exists)
            }
            None => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "index"
    }
}
