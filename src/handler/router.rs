//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Every response leaving the route
//! table passes through `handle_request`, which stamps the CORS headers and
//! writes the access log line.

use crate::config::Config;
use crate::handler::{health, upload};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, REFERER, USER_AGENT};
use hyper::{Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

pub const UPLOAD_PATH: &str = "/file";
pub const HEALTH_PATH: &str = "/health";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    config: Arc<Config>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let started = Instant::now();
    let access = config
        .logging
        .access_log
        .then(|| access_entry(&req, remote_addr));

    let mut response = route_request(req, &config).await;
    http::apply_cors_headers(response.headers_mut());

    if let Some(mut entry) = access {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request by exact path
async fn route_request<B>(req: Request<B>, config: &Config) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let path = req.uri().path().to_owned();
    match path.as_str() {
        UPLOAD_PATH => match upload::handle_upload(req, config).await {
            Ok(response) => response,
            Err(err) => {
                err.log();
                http::build_error_response(err.status(), err.client_message())
            }
        },
        HEALTH_PATH => health::handle_health(),
        _ => http::build_404_response(),
    }
}

fn access_entry<B>(req: &Request<B>, remote_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        remote_addr.to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = http_version(req.version()).to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}

const fn http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::TEXT_PLAIN_UTF8;
    use http_body_util::BodyExt;
    use hyper::header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        CONTENT_TYPE,
    };
    use hyper::{Method, StatusCode};
    use std::path::Path;

    const BOUNDARY: &str = "router-boundary";

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn config_for(dir: &Path) -> Arc<Config> {
        Arc::new(Config {
            upload_dir: dir.to_path_buf(),
            ..Config::default()
        })
    }

    fn upload_request(method: Method, field: &str, filename: &str, content: &[u8]) -> Request<Full<Bytes>> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(method)
            .uri(UPLOAD_PATH)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Full::new(Bytes::from(body)))
            .unwrap()
    }

    fn empty_request(method: Method, path: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn send(req: Request<Full<Bytes>>, config: &Arc<Config>) -> (StatusCode, hyper::HeaderMap, String) {
        let resp = handle_request(req, Arc::clone(config), peer()).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn assert_cors(headers: &hyper::HeaderMap) {
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(headers[CONTENT_TYPE], TEXT_PLAIN_UTF8);
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_health_any_method() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        for method in [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS] {
            let (status, headers, body) = send(empty_request(method, HEALTH_PATH), &config).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "Server is healthy");
            assert_cors(&headers);
        }
    }

    #[tokio::test]
    async fn test_health_ignores_broken_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("does/not/exist"));

        let (status, _, body) = send(empty_request(Method::GET, HEALTH_PATH), &config).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Server is healthy");
    }

    #[tokio::test]
    async fn test_upload_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        let req = upload_request(Method::POST, "image", "a.txt", b"abcdefghij");
        let (status, headers, body) = send(req, &config).await;

        assert_eq!(status, StatusCode::OK);
        assert_cors(&headers);
        assert!(body.starts_with("File uploaded successfully: "));
        assert!(body.ends_with("_a.txt"));

        let stored = body.trim_start_matches("File uploaded successfully: ");
        assert_eq!(std::fs::read(dir.path().join(stored)).unwrap(), b"abcdefghij");
    }

    #[tokio::test]
    async fn test_errors_carry_cors_and_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(Config {
            max_file_size: 4,
            ..Config::clone(&config_for(dir.path()))
        });

        let cases = [
            (upload_request(Method::GET, "image", "a.txt", b"x"), StatusCode::METHOD_NOT_ALLOWED, "Method not allowed\n"),
            (upload_request(Method::POST, "other", "a.txt", b"x"), StatusCode::BAD_REQUEST, "No file provided or invalid file field\n"),
            (empty_request(Method::POST, UPLOAD_PATH), StatusCode::BAD_REQUEST, "Failed to parse multipart form\n"),
            (upload_request(Method::POST, "image", "a.txt", b"too long"), StatusCode::PAYLOAD_TOO_LARGE, "File too large\n"),
        ];

        for (req, expected_status, expected_body) in cases {
            let (status, headers, body) = send(req, &config).await;
            assert_eq!(status, expected_status);
            assert_eq!(body, expected_body);
            assert_cors(&headers);
        }
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_create_failure_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("gone"));

        let req = upload_request(Method::POST, "image", "a.txt", b"x");
        let (status, headers, body) = send(req, &config).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to create file\n");
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_with_cors() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        for path in ["/", "/file/", "/files", "/healthz"] {
            let (status, headers, body) = send(empty_request(Method::GET, path), &config).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, "404 page not found\n");
            assert_cors(&headers);
        }
    }

    #[tokio::test]
    async fn test_access_log_enabled_still_responds() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::clone(&config_for(dir.path()));
        cfg.logging.access_log = true;
        cfg.logging.access_log_format = "combined".to_string();
        let config = Arc::new(cfg);

        let req = Request::builder()
            .method(Method::GET)
            .uri("/health?probe=1")
            .header(USER_AGENT, "kube-probe/1.29")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, _, _) = send(req, &config).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_access_entry_fields() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/file?x=1")
            .version(Version::HTTP_10)
            .header(REFERER, "https://app.example")
            .body(())
            .unwrap();

        let entry = access_entry(&req, peer());
        assert_eq!(entry.remote_addr, "127.0.0.1:40000");
        assert_eq!(entry.method, "POST");
        assert_eq!(entry.path, "/file");
        assert_eq!(entry.query.as_deref(), Some("x=1"));
        assert_eq!(entry.http_version, "1.0");
        assert_eq!(entry.referer.as_deref(), Some("https://app.example"));
        assert_eq!(entry.user_agent, None);
    }
}
