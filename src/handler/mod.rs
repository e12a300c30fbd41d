//! Request handler module
//!
//! Responsible for route dispatch, the upload flow and the liveness probe.

pub mod error;
pub mod health;
pub mod router;
pub mod upload;

// Re-export main entry point
pub use router::handle_request;
