//! Service layer: fingerprinting, detection, upload storage, scan flows and views

pub mod ai_detector;
pub mod fingerprinter;
pub mod query_views;
pub mod scan_service;
pub mod upload_store;

pub use ai_detector::{DetectorError, HttpDetectorClient, ImageDetector};
pub use fingerprinter::{fingerprint, fingerprint_blocking, DIGEST_HEX_LEN};
pub use query_views::{history, vault, HISTORY_LIMIT, VAULT_LIMIT};
pub use scan_service::{CompareOutcome, DetectOutcome, ScanService, TagOutcome, Upload};
pub use upload_store::{StoredUpload, UploadStore};
