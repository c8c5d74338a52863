//! AI detection outcome
//!
//! A detection request ends in exactly one of two states: the detector answered,
//! or it could not be reached (network failure, non-2xx status, timeout, garbled
//! body). "Not requested" is represented by the absence of an outcome.
//!
//! On the wire an unavailable detector keeps the legacy shape
//! `{error, ai_score: 0.0, ai_generated: false}`, while the persisted `ai_status`
//! keeps the two cases apart.

use serde::{Deserialize, Serialize, Serializer};

/// Error text reported to clients when the detector could not be used
pub const UNAVAILABLE_MESSAGE: &str = "AI service unavailable";

/// Verdict returned by a reachable detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiVerdict {
    /// Probability that the image is AI-generated (0.0 to 1.0)
    pub ai_score: f64,
    pub ai_generated: bool,
    /// Detector confidence in percent, when the detector reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Result of one detection attempt
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    Detected(AiVerdict),
    Unavailable { reason: String },
}

/// Persisted detection status of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiStatus {
    Detected,
    Unavailable,
}

impl AiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiStatus::Detected => "detected",
            AiStatus::Unavailable => "unavailable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "detected" => Some(AiStatus::Detected),
            "unavailable" => Some(AiStatus::Unavailable),
            _ => None,
        }
    }
}

impl DetectionOutcome {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        DetectionOutcome::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> AiStatus {
        match self {
            DetectionOutcome::Detected(_) => AiStatus::Detected,
            DetectionOutcome::Unavailable { .. } => AiStatus::Unavailable,
        }
    }

    /// The verdict, if the detector answered
    pub fn verdict(&self) -> Option<&AiVerdict> {
        match self {
            DetectionOutcome::Detected(verdict) => Some(verdict),
            DetectionOutcome::Unavailable { .. } => None,
        }
    }

    /// Score as reported to clients (0.0 when unavailable)
    pub fn ai_score(&self) -> f64 {
        self.verdict().map(|v| v.ai_score).unwrap_or(0.0)
    }

    /// Verdict as reported to clients (false when unavailable)
    pub fn ai_generated(&self) -> bool {
        self.verdict().map(|v| v.ai_generated).unwrap_or(false)
    }
}

#[derive(Serialize)]
struct DetectionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    ai_score: f64,
    ai_generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
}

impl Serialize for DetectionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let payload = match self {
            DetectionOutcome::Detected(verdict) => DetectionPayload {
                error: None,
                ai_score: verdict.ai_score,
                ai_generated: verdict.ai_generated,
                confidence: verdict.confidence,
            },
            DetectionOutcome::Unavailable { .. } => DetectionPayload {
                error: Some(UNAVAILABLE_MESSAGE),
                ai_score: 0.0,
                ai_generated: false,
                confidence: None,
            },
        };
        payload.serialize(serializer)
    }
}
