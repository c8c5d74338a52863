//! Durable storage of uploaded files
//!
//! Stored names are `<unix millis>-<7 base36 chars>-<sanitized original name>` so
//! concurrent uploads with the same original name never collide. Files are exposed
//! to clients under the `/uploads/` locator prefix.

use deepscan_common::Result;
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// URL prefix under which stored files are served
pub const LOCATOR_PREFIX: &str = "/uploads";

const DISAMBIGUATOR_LEN: usize = 7;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A file written to the uploads directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// File name inside the uploads directory
    pub stored_name: String,
    /// Absolute or root-relative path on disk
    pub path: PathBuf,
    /// Client-facing locator, e.g. `/uploads/1700000000000-k3j9x2a-cat.png`
    pub locator: String,
}

/// Uploads directory writer
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write bytes under a fresh name and flush them to disk
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredUpload> {
        let stored_name = stored_name_for(original_name);
        let path = self.dir.join(&stored_name);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;

        tracing::debug!(
            path = %path.display(),
            size = bytes.len(),
            "Upload stored"
        );

        Ok(StoredUpload {
            locator: format!("{}/{}", LOCATOR_PREFIX, stored_name),
            stored_name,
            path,
        })
    }

    /// Remove a stored file, logging instead of failing
    pub async fn discard(&self, upload: &StoredUpload) {
        match tokio::fs::remove_file(&upload.path).await {
            Ok(()) => tracing::info!(path = %upload.path.display(), "Removed orphaned upload"),
            Err(e) => tracing::warn!(
                path = %upload.path.display(),
                error = %e,
                "Failed to remove orphaned upload"
            ),
        }
    }
}

fn stored_name_for(original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let disambiguator: String = (0..DISAMBIGUATOR_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    format!("{}-{}-{}", millis, disambiguator, sanitize_file_name(original_name))
}

/// Keep the final path component and replace anything outside `[A-Za-z0-9._-]`
pub fn sanitize_file_name(original_name: &str) -> String {
    let last = original_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        cleaned
    }
}
