//! Runtime configuration for deepscan-vault
//!
//! Settings resolve in priority order: command line (with its environment variable
//! fallbacks), TOML bootstrap file, compiled defaults. The root folder follows
//! the shared resolution in `deepscan_common::config`.

use deepscan_common::config::{resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV};
use deepscan_common::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Values supplied on the command line or through its environment fallbacks
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub detector_url: Option<String>,
    pub detector_timeout_secs: Option<u64>,
    pub public_dir: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub detector_url: String,
    pub detector_timeout: Duration,
    pub public_dir: PathBuf,
    /// Per-file upload limit
    pub max_upload_bytes: usize,
}

impl ServiceConfig {
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Result<Self> {
        let root_folder = resolve_root_folder(
            overrides.root_folder.as_deref(),
            ROOT_FOLDER_ENV,
            toml.root_folder.as_deref(),
        );

        let timeout_secs = overrides
            .detector_timeout_secs
            .unwrap_or(toml.detector.timeout_secs);
        if timeout_secs == 0 {
            return Err(Error::Config(
                "Detector timeout must be at least one second".to_string(),
            ));
        }

        if toml.max_upload_bytes == 0 {
            return Err(Error::Config(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            root_folder,
            host: overrides.host.unwrap_or(toml.host),
            port: overrides.port.unwrap_or(toml.port),
            detector_url: overrides.detector_url.unwrap_or(toml.detector.url),
            detector_timeout: Duration::from_secs(timeout_secs),
            public_dir: overrides.public_dir.unwrap_or(toml.public_dir),
            max_upload_bytes: toml.max_upload_bytes,
        })
    }
}
