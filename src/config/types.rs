// Configuration types module
// Defines the resolved runtime configuration and the raw environment view it is built from

use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_PORT: &str = "8080";
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";
pub const DEFAULT_MAX_FILE_SIZE: i64 = 100 << 20; // 100MB
pub const DEFAULT_ACCESS_LOG_FORMAT: &str = "common";

/// Main configuration structure
///
/// Built once at startup and shared read-only between request handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Listen port, kept verbatim as given
    pub port: String,
    /// Flat directory receiving uploaded files
    pub upload_dir: PathBuf,
    /// Upload ceiling in bytes. Zero and negative values are accepted as-is.
    pub max_file_size: i64,
    /// Reduce uploaded names to their last path component
    pub sanitize_filenames: bool,
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub access_log: bool,
    pub access_log_format: String,
    pub access_log_file: Option<String>,
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: false,
            access_log_format: DEFAULT_ACCESS_LOG_FORMAT.to_string(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            sanitize_filenames: false,
            logging: LoggingConfig::default(),
        }
    }
}

/// Environment values exactly as found, before fallbacks are applied
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawSettings {
    pub port: Option<String>,
    pub upload_dir: Option<String>,
    pub max_file_size: Option<String>,
    pub sanitize_filenames: Option<String>,
    pub access_log: Option<String>,
    pub access_log_format: Option<String>,
    pub access_log_file: Option<String>,
    pub error_log_file: Option<String>,
}
