//! HTTP protocol layer module
//!
//! Response builders and the CORS header set, decoupled from the upload logic.

pub mod response;

pub use response::{
    apply_cors_headers, build_404_response, build_error_response, build_text_response,
};
