//! Data models for deepscan-vault

pub mod detection;
pub mod record;

pub use detection::{AiStatus, AiVerdict, DetectionOutcome, UNAVAILABLE_MESSAGE};
pub use record::{NewRecord, Record};
