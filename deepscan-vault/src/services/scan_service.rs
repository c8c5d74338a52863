//! Scan flows: tag-and-store, compare, detect-only
//!
//! Every flow runs the same stages:
//!
//! ```text
//! received → stored on disk → fingerprinted → [detected] → persisted → responded
//! ```
//!
//! Fingerprinting always happens before detection, so a hashing failure never
//! leaves a detector call behind. Exactly one record is inserted per successful
//! call. If anything after the disk write fails (including the insert) the files
//! written by that call are removed and no digests are returned.

use axum::body::Bytes;
use deepscan_common::{Error, Result};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::RecordStore;
use crate::models::{DetectionOutcome, NewRecord};
use crate::services::ai_detector::ImageDetector;
use crate::services::fingerprinter::fingerprint_blocking;
use crate::services::upload_store::{StoredUpload, UploadStore};

/// Message returned when the compare flow gets the wrong number of files
pub const COMPARE_FILE_COUNT_MESSAGE: &str = "Please upload exactly 2 images";

/// One uploaded file as received from the transport
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Result of the tag-and-store flow
#[derive(Debug, Clone)]
pub struct TagOutcome {
    pub hash: String,
    pub file_path: String,
    /// None when detection was not requested
    pub ai_result: Option<DetectionOutcome>,
    pub record_id: Uuid,
}

/// Result of the compare flow
#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub hash1: String,
    pub hash2: String,
    pub is_match: bool,
    pub record_id: Uuid,
}

/// Result of the detect-only flow
#[derive(Debug, Clone)]
pub struct DetectOutcome {
    pub hash: String,
    pub detection: DetectionOutcome,
    pub record_id: Uuid,
}

/// Orchestrates fingerprinting, detection and persistence
pub struct ScanService {
    store: Arc<dyn RecordStore>,
    uploads: UploadStore,
    detector: Arc<dyn ImageDetector>,
}

impl ScanService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        uploads: UploadStore,
        detector: Arc<dyn ImageDetector>,
    ) -> Self {
        Self {
            store,
            uploads,
            detector,
        }
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    /// Store and fingerprint one file, optionally asking the detector about it
    pub async fn tag_and_store(&self, upload: Upload, run_detection: bool) -> Result<TagOutcome> {
        let stored = self.uploads.save(&upload.filename, &upload.bytes).await?;

        let result: Result<TagOutcome> = async {
            let hash = fingerprint_blocking(upload.bytes.clone()).await?;

            let ai_result = if run_detection {
                Some(self.detector.detect(&upload.bytes, &upload.filename).await)
            } else {
                None
            };

            let mut record = NewRecord::single(hash.clone(), Some(stored.locator.clone()));
            if let Some(outcome) = &ai_result {
                record = record.with_detection(outcome.clone());
            }
            let record = self.store.insert(record).await?;

            Ok(TagOutcome {
                hash,
                file_path: stored.locator.clone(),
                ai_result,
                record_id: record.id,
            })
        }
        .await;

        let outcome = self.finish("tag_and_store", result, &[&stored]).await?;
        info!(
            record_id = %outcome.record_id,
            hash = %outcome.hash,
            detection = run_detection,
            "Upload fingerprinted"
        );
        Ok(outcome)
    }

    /// Fingerprint exactly two files and record whether their contents match
    pub async fn compare(&self, uploads: Vec<Upload>) -> Result<CompareOutcome> {
        let [first, second]: [Upload; 2] = uploads
            .try_into()
            .map_err(|_| Error::InvalidInput(COMPARE_FILE_COUNT_MESSAGE.to_string()))?;

        let stored1 = self.uploads.save(&first.filename, &first.bytes).await?;
        let stored2 = match self.uploads.save(&second.filename, &second.bytes).await {
            Ok(stored) => stored,
            Err(e) => {
                self.uploads.discard(&stored1).await;
                return Err(e);
            }
        };

        let result: Result<CompareOutcome> = async {
            let hash1 = fingerprint_blocking(first.bytes.clone()).await?;
            let hash2 = fingerprint_blocking(second.bytes.clone()).await?;

            let record = NewRecord::comparison(
                hash1.clone(),
                Some(stored1.locator.clone()),
                hash2.clone(),
                Some(stored2.locator.clone()),
            );
            let is_match = record.is_match().unwrap_or(false);
            let record = self.store.insert(record).await?;

            Ok(CompareOutcome {
                hash1,
                hash2,
                is_match,
                record_id: record.id,
            })
        }
        .await;

        let outcome = self.finish("compare", result, &[&stored1, &stored2]).await?;
        info!(
            record_id = %outcome.record_id,
            is_match = outcome.is_match,
            "Comparison recorded"
        );
        Ok(outcome)
    }

    /// Store, fingerprint and always run detection on one file
    pub async fn detect_only(&self, upload: Upload) -> Result<DetectOutcome> {
        let stored = self.uploads.save(&upload.filename, &upload.bytes).await?;

        let result: Result<DetectOutcome> = async {
            let hash = fingerprint_blocking(upload.bytes.clone()).await?;
            let detection = self.detector.detect(&upload.bytes, &upload.filename).await;

            let record = NewRecord::single(hash.clone(), Some(stored.locator.clone()))
                .with_detection(detection.clone());
            let record = self.store.insert(record).await?;

            Ok(DetectOutcome {
                hash,
                detection,
                record_id: record.id,
            })
        }
        .await;

        let outcome = self.finish("detect_only", result, &[&stored]).await?;
        info!(
            record_id = %outcome.record_id,
            hash = %outcome.hash,
            ai_status = outcome.detection.status().as_str(),
            "Detection recorded"
        );
        Ok(outcome)
    }

    /// Remove this call's files when the flow failed after writing them
    async fn finish<T>(
        &self,
        flow: &str,
        result: Result<T>,
        written: &[&StoredUpload],
    ) -> Result<T> {
        if let Err(e) = &result {
            error!(flow, error = %e, "Scan flow failed, discarding stored uploads");
            for stored in written {
                self.uploads.discard(stored).await;
            }
        }
        result
    }
}
