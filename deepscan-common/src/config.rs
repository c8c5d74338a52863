//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from a small TOML file. Everything in it is optional:
//! a missing or unreadable file logs a warning and the compiled defaults apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "DEEPSCAN_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "deepscan.db";

/// Upload directory name inside the root folder
pub const UPLOADS_DIR: &str = "uploads";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database and stored uploads
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static front-end assets
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Largest accepted upload, per file
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// External AI detector settings
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// External AI detector settings
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Full URL of the detector's image-check endpoint
    #[serde(default = "default_detector_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_detector_timeout_secs")]
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("./public")
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_detector_url() -> String {
    "http://localhost:5001/check-image".to_string()
}

fn default_detector_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            detector: DetectorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            url: default_detector_url(),
            timeout_secs: default_detector_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Read configuration without logging
    ///
    /// Without an explicit path the platform config file is used if it exists;
    /// when there is none the defaults are returned.
    pub fn try_load(explicit_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let path = match explicit_path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok((Self::default(), ConfigSource::Defaults)),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Could not read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;

        Ok((config, ConfigSource::File(path)))
    }

    /// Load configuration with graceful degradation
    ///
    /// A config file that cannot be read or parsed is reported as a warning and
    /// defaults are used.
    pub fn load(explicit_path: Option<&Path>) -> Self {
        match Self::try_load(explicit_path) {
            Ok((config, source)) => {
                source.log();
                config
            }
            Err(e) => {
                warn!("{} (using defaults)", e);
                Self::default()
            }
        }
    }
}

/// Where the bootstrap configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Defaults => info!("No config file found, using built-in defaults"),
        }
    }
}

/// Platform config file location (`<config dir>/deepscan/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("deepscan").join("config.toml"))
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config value
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    get_default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/deepscan
        dirs::data_local_dir()
            .map(|d| d.join("deepscan"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/deepscan"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("deepscan"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/deepscan"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("deepscan"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\deepscan"))
    } else {
        PathBuf::from("./deepscan_data")
    }
}

/// Creates the root folder layout on first run
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create root folder and uploads directory if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(self.uploads_path())?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.root_folder.join(UPLOADS_DIR)
    }
}
