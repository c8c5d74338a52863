//! Fingerprint record model
//!
//! One record is written per fingerprinting or comparison event and never changes
//! afterwards. `NewRecord` can only be built through constructors that uphold the
//! field invariants:
//! - `file2_hash` and `match` are present together, only for comparisons
//! - `match` is exact digest equality
//! - `ai_score`/`ai_generated` are present only when the detector answered

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::detection::{AiStatus, DetectionOutcome};

/// Stored fingerprint record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Assigned by the store on insert
    pub id: Uuid,
    pub file1_hash: String,
    pub file2_hash: Option<String>,
    pub file1_path: Option<String>,
    pub file2_path: Option<String>,
    #[serde(rename = "match")]
    pub is_match: Option<bool>,
    pub ai_score: Option<f64>,
    pub ai_generated: Option<bool>,
    /// None when detection was not requested
    pub ai_status: Option<AiStatus>,
    /// Assigned by the store on insert; sole sort key for listings
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// True for records produced by the compare flow
    pub fn is_comparison(&self) -> bool {
        self.file2_hash.is_some()
    }
}

/// Record contents before the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    file1_hash: String,
    file1_path: Option<String>,
    comparison: Option<Comparison>,
    detection: Option<DetectionOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
struct Comparison {
    file2_hash: String,
    file2_path: Option<String>,
}

impl NewRecord {
    /// Record for a single fingerprinted file
    pub fn single(file1_hash: impl Into<String>, file1_path: Option<String>) -> Self {
        Self {
            file1_hash: file1_hash.into(),
            file1_path,
            comparison: None,
            detection: None,
        }
    }

    /// Record for a two-file comparison
    pub fn comparison(
        file1_hash: impl Into<String>,
        file1_path: Option<String>,
        file2_hash: impl Into<String>,
        file2_path: Option<String>,
    ) -> Self {
        Self {
            file1_hash: file1_hash.into(),
            file1_path,
            comparison: Some(Comparison {
                file2_hash: file2_hash.into(),
                file2_path,
            }),
            detection: None,
        }
    }

    /// Attach the outcome of a detection request
    pub fn with_detection(mut self, outcome: DetectionOutcome) -> Self {
        self.detection = Some(outcome);
        self
    }

    pub fn file1_hash(&self) -> &str {
        &self.file1_hash
    }

    pub fn file1_path(&self) -> Option<&str> {
        self.file1_path.as_deref()
    }

    pub fn file2_hash(&self) -> Option<&str> {
        self.comparison.as_ref().map(|c| c.file2_hash.as_str())
    }

    pub fn file2_path(&self) -> Option<&str> {
        self.comparison.as_ref().and_then(|c| c.file2_path.as_deref())
    }

    /// Byte-exact equality of the two digests; None for single-file records
    pub fn is_match(&self) -> Option<bool> {
        self.comparison
            .as_ref()
            .map(|c| c.file2_hash == self.file1_hash)
    }

    pub fn ai_score(&self) -> Option<f64> {
        self.detection
            .as_ref()
            .and_then(DetectionOutcome::verdict)
            .map(|v| v.ai_score)
    }

    pub fn ai_generated(&self) -> Option<bool> {
        self.detection
            .as_ref()
            .and_then(DetectionOutcome::verdict)
            .map(|v| v.ai_generated)
    }

    pub fn ai_status(&self) -> Option<AiStatus> {
        self.detection.as_ref().map(DetectionOutcome::status)
    }

    /// Complete the record with store-assigned identity and timestamp
    pub fn into_record(self, id: Uuid, created_at: DateTime<Utc>) -> Record {
        Record {
            id,
            is_match: self.is_match(),
            ai_score: self.ai_score(),
            ai_generated: self.ai_generated(),
            ai_status: self.ai_status(),
            file2_hash: self.comparison.as_ref().map(|c| c.file2_hash.clone()),
            file2_path: self.comparison.and_then(|c| c.file2_path),
            file1_hash: self.file1_hash,
            file1_path: self.file1_path,
            created_at,
        }
    }
}
