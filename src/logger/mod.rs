//! Logger module
//!
//! Provides logging utilities for the upload server including:
//! - Server lifecycle logging
//! - Access logging in `common` or `combined` format
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use chrono::Local;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn stamp(message: &str) -> String {
    format!("{} {message}", Local::now().format("%Y/%m/%d %H:%M:%S"))
}

/// Write to info/access log
fn write_info(message: &str) {
    let line = stamp(message);
    match writer::get() {
        Some(w) => w.write_info(&line),
        None => println!("{line}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    let line = stamp(message);
    match writer::get() {
        Some(w) => w.write_error(&line),
        None => eprintln!("{line}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info(&format!("[INFO] Server starting on port {}", config.port));
    write_info(&format!("[INFO] Listening on: http://{addr}"));
    write_info(&format!(
        "[INFO] Upload directory: {}",
        config.upload_dir.display()
    ));
    write_info(&format!(
        "[INFO] Max file size: {} bytes",
        config.max_file_size
    ));
    if config.sanitize_filenames {
        write_info("[INFO] Uploaded file names are reduced to their last path component");
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("[INFO] Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("[INFO] Error log: {path}"));
    }
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log an error that ends the process
pub fn log_fatal(message: &str) {
    write_error(&format!("[FATAL] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_info(&line),
        None => println!("{line}"),
    }
}

pub fn log_shutdown(signal: &str) {
    write_info(&format!("[INFO] {signal} received, no longer accepting connections"));
}
