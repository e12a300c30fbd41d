//! Liveness probe

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::http;

pub const HEALTHY_BODY: &str = "Server is healthy";

/// Answer any method with 200. Storage and configuration are not checked.
pub fn handle_health() -> Response<Full<Bytes>> {
    http::build_text_response(StatusCode::OK, HEALTHY_BODY)
}
