// Configuration module entry point
// Reads settings from the environment once at startup

mod types;

use std::net::SocketAddr;
use std::path::PathBuf;

pub use types::{Config, LoggingConfig, DEFAULT_MAX_FILE_SIZE};
use types::RawSettings;

impl Config {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an explicit variable map, or the process
    /// environment when `vars` is `None`
    pub fn load_from(vars: Option<config::Map<String, String>>) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::default().source(vars))
            .build()?;

        let raw: RawSettings = settings.try_deserialize()?;
        Ok(Self::resolve(raw))
    }

    fn resolve(raw: RawSettings) -> Self {
        let defaults = Self::default();

        let max_file_size = raw
            .max_file_size
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_MAX_FILE_SIZE);

        Self {
            port: non_empty(raw.port).unwrap_or(defaults.port),
            upload_dir: non_empty(raw.upload_dir).map_or(defaults.upload_dir, PathBuf::from),
            max_file_size,
            sanitize_filenames: raw
                .sanitize_filenames
                .as_deref()
                .and_then(parse_flag)
                .unwrap_or(defaults.sanitize_filenames),
            logging: LoggingConfig {
                access_log: raw
                    .access_log
                    .as_deref()
                    .and_then(parse_flag)
                    .unwrap_or(defaults.logging.access_log),
                access_log_format: non_empty(raw.access_log_format)
                    .unwrap_or(defaults.logging.access_log_format),
                access_log_file: non_empty(raw.access_log_file),
                error_log_file: non_empty(raw.error_log_file),
            },
        }
    }

    /// Address the listener binds, on all interfaces
    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("0.0.0.0:{}", self.port)
            .parse()
            .map_err(|e| format!("Invalid port '{}': {e}", self.port))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Config {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<config::Map<String, String>>();
        Config::load_from(Some(vars)).expect("config should load")
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = load(&[]);
        assert_eq!(cfg.port, "8080");
        assert_eq!(cfg.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(cfg.max_file_size, 104_857_600);
        assert!(!cfg.sanitize_filenames);
        assert!(!cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "common");
        assert_eq!(cfg.logging.access_log_file, None);
    }

    #[test]
    fn test_values_taken_verbatim() {
        let cfg = load(&[
            ("PORT", "9090"),
            ("UPLOAD_DIR", "/tmp/t1"),
            ("MAX_FILE_SIZE", "2048"),
        ]);
        assert_eq!(cfg.port, "9090");
        assert_eq!(cfg.upload_dir, PathBuf::from("/tmp/t1"));
        assert_eq!(cfg.max_file_size, 2048);
    }

    #[test]
    fn test_empty_values_fall_back() {
        let cfg = load(&[("PORT", ""), ("UPLOAD_DIR", ""), ("MAX_FILE_SIZE", "")]);
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_malformed_max_file_size_falls_back() {
        assert_eq!(
            load(&[("MAX_FILE_SIZE", "not-a-number")]).max_file_size,
            DEFAULT_MAX_FILE_SIZE
        );
        assert_eq!(
            load(&[("MAX_FILE_SIZE", "10MB")]).max_file_size,
            DEFAULT_MAX_FILE_SIZE
        );
        assert_eq!(
            load(&[("MAX_FILE_SIZE", "99999999999999999999")]).max_file_size,
            DEFAULT_MAX_FILE_SIZE
        );
    }

    #[test]
    fn test_zero_and_negative_max_file_size_kept() {
        assert_eq!(load(&[("MAX_FILE_SIZE", "0")]).max_file_size, 0);
        assert_eq!(load(&[("MAX_FILE_SIZE", "-5")]).max_file_size, -5);
    }

    #[test]
    fn test_flags() {
        let cfg = load(&[("SANITIZE_FILENAMES", "true"), ("ACCESS_LOG", "ON")]);
        assert!(cfg.sanitize_filenames);
        assert!(cfg.logging.access_log);

        let cfg = load(&[("SANITIZE_FILENAMES", "maybe"), ("ACCESS_LOG", "0")]);
        assert!(!cfg.sanitize_filenames);
        assert!(!cfg.logging.access_log);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = load(&[("PORT", "3000")]);
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 3000);

        let cfg = load(&[("PORT", "http")]);
        assert!(cfg.get_socket_addr().is_err());
        let cfg = load(&[("PORT", "70000")]);
        assert!(cfg.get_socket_addr().is_err());
    }
}
