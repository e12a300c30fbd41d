//! HTTP response building module
//!
//! Provides builders for the plain-text responses the server emits, plus the
//! CORS header set stamped on every response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS,
};
use hyper::{Response, StatusCode};

pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Build a plain-text response with the given status and body
pub fn build_text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let body = body.into();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT_PLAIN_UTF8)
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            Response::new(Full::new(body))
        })
}

/// Build a plain-text error response: one line, newline-terminated, not sniffable
pub fn build_error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = Bytes::from(format!("{message}\n"));
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT_PLAIN_UTF8)
        .header(X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            let mut resp = Response::new(Full::new(body));
            *resp.status_mut() = status;
            resp
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_error_response(StatusCode::NOT_FOUND, "404 page not found")
}

/// Stamp the CORS header set onto a response, replacing any existing values
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF8));
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
