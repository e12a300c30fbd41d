//! Upload request errors
//!
//! Each variant maps to one status code and one fixed client message. The
//! detailed cause only goes to the server log.

use hyper::{Method, StatusCode};
use std::fmt;
use std::io;

use crate::logger;

#[derive(Debug)]
pub enum UploadError {
    MethodNotAllowed(Method),
    /// Body is not multipart, is malformed, or the client went away mid-body
    InvalidMultipart(String),
    /// No usable `image` file part
    MissingFile(String),
    /// Name left empty after sanitizing
    InvalidFilename(String),
    TooLarge { size: i64, max: i64 },
    /// Spooling the incoming part to a temporary file failed
    Spool(io::Error),
    Create(io::Error),
    Save(io::Error),
}

impl UploadError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidMultipart(_) | Self::MissingFile(_) | Self::InvalidFilename(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Spool(_) | Self::Create(_) | Self::Save(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client
    pub const fn client_message(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed(_) => "Method not allowed",
            Self::InvalidMultipart(_) => "Failed to parse multipart form",
            Self::MissingFile(_) => "No file provided or invalid file field",
            Self::InvalidFilename(_) => "Invalid file name",
            Self::TooLarge { .. } => "File too large",
            Self::Create(_) => "Failed to create file",
            Self::Spool(_) | Self::Save(_) => "Failed to save file",
        }
    }

    pub fn log(&self) {
        match self {
            Self::MethodNotAllowed(_) => logger::log_warning(&self.to_string()),
            _ => logger::log_error(&self.to_string()),
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MethodNotAllowed(method) => write!(f, "Method not allowed: {method}"),
            Self::InvalidMultipart(e) => write!(f, "Error parsing multipart form: {e}"),
            Self::MissingFile(e) => write!(f, "Error getting file from form: {e}"),
            Self::InvalidFilename(name) => write!(f, "Rejected file name: {name:?}"),
            Self::TooLarge { size, max } => {
                write!(f, "File too large: {size} bytes (max: {max})")
            }
            Self::Spool(e) => write!(f, "Error buffering upload: {e}"),
            Self::Create(e) => write!(f, "Error creating file: {e}"),
            Self::Save(e) => write!(f, "Error copying file: {e}"),
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spool(e) | Self::Create(e) | Self::Save(e) => Some(e),
            _ => None,
        }
    }
}
