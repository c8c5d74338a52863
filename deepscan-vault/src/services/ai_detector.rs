//! External AI-generated-content detector client
//!
//! The detector is a separate HTTP service taking a multipart `image` field and
//! answering `{ai_score, ai_generated, confidence?}`. Every failure (network error,
//! timeout, non-2xx status, unusable body) becomes `DetectionOutcome::Unavailable`
//! so an unreachable detector never fails an upload. Timed-out calls are abandoned,
//! not retried.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{AiVerdict, DetectionOutcome};

const USER_AGENT: &str = concat!("DeepScan/", env!("CARGO_PKG_VERSION"));

/// Image field name expected by the detector
const IMAGE_FIELD: &str = "image";

/// Detector client errors
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Detector timed out after {0:?}")]
    Timeout(Duration),

    #[error("Detector returned {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Anything that can classify an image as AI-generated or not
#[async_trait]
pub trait ImageDetector: Send + Sync {
    /// Classify an image; never fails, degrades to `Unavailable`
    async fn detect(&self, image: &[u8], filename: &str) -> DetectionOutcome;
}

/// Detector success body
#[derive(Debug, Deserialize)]
struct DetectorResponse {
    ai_score: f64,
    ai_generated: bool,
    #[serde(default)]
    confidence: Option<f64>,
}

/// HTTP detector client
pub struct HttpDetectorClient {
    http_client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpDetectorClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DetectorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| DetectorError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one image to the detector
    pub async fn request(&self, image: &[u8], filename: &str) -> Result<AiVerdict, DetectorError> {
        let part = Part::bytes(image.to_vec()).file_name(filename.to_string());
        let form = Form::new().part(IMAGE_FIELD, part);

        tracing::debug!(
            endpoint = %self.endpoint,
            size = image.len(),
            "Sending image to AI detector"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DetectorError::ApiError(status.as_u16(), error_text));
        }

        let body: DetectorResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                DetectorError::Timeout(self.timeout)
            } else {
                DetectorError::ParseError(e.to_string())
            }
        })?;

        if !body.ai_score.is_finite() || !(0.0..=1.0).contains(&body.ai_score) {
            return Err(DetectorError::ParseError(format!(
                "ai_score out of range: {}",
                body.ai_score
            )));
        }

        Ok(AiVerdict {
            ai_score: body.ai_score,
            ai_generated: body.ai_generated,
            confidence: body.confidence,
        })
    }

    fn classify(&self, e: reqwest::Error) -> DetectorError {
        if e.is_timeout() {
            DetectorError::Timeout(self.timeout)
        } else {
            DetectorError::NetworkError(e.to_string())
        }
    }
}

#[async_trait]
impl ImageDetector for HttpDetectorClient {
    async fn detect(&self, image: &[u8], filename: &str) -> DetectionOutcome {
        match self.request(image, filename).await {
            Ok(verdict) => {
                tracing::info!(
                    ai_score = verdict.ai_score,
                    ai_generated = verdict.ai_generated,
                    "AI detection completed"
                );
                DetectionOutcome::Detected(verdict)
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "AI detection unavailable, continuing without verdict"
                );
                DetectionOutcome::unavailable(e.to_string())
            }
        }
    }
}
