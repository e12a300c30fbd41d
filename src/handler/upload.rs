//! File upload handler
//!
//! `POST /file` with a `multipart/form-data` body carrying the file under the
//! `image` field. The part is spooled to an anonymous temporary file while the
//! body is parsed, checked against the size ceiling, and only then copied into
//! the upload directory as `<unix-seconds>_<original-filename>`.

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Response, StatusCode};
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use super::error::UploadError;
use crate::config::Config;
use crate::http;
use crate::logger;
use crate::storage;

/// Multipart field holding the uploaded file
pub const FILE_FIELD: &str = "image";

/// The `image` part, fully received
struct SpooledUpload {
    file: File,
    file_name: String,
    size: i64,
}

/// Handle an upload request
pub async fn handle_upload<B>(
    req: Request<B>,
    config: &Config,
) -> Result<Response<Full<Bytes>>, UploadError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    if req.method() != Method::POST {
        return Err(UploadError::MethodNotAllowed(req.method().clone()));
    }

    let boundary = extract_boundary(&req)?;
    let mut upload = receive_file(req.into_body(), boundary, config.max_file_size).await?;

    if upload.size > config.max_file_size {
        return Err(UploadError::TooLarge {
            size: upload.size,
            max: config.max_file_size,
        });
    }

    let timestamp = chrono::Utc::now().timestamp();
    let filename =
        storage::build_filename(timestamp, &upload.file_name, config.sanitize_filenames)
            .ok_or_else(|| UploadError::InvalidFilename(upload.file_name.clone()))?;
    let path = storage::destination_path(&config.upload_dir, &filename);

    let mut dst = File::create(&path).await.map_err(UploadError::Create)?;

    // A failed copy leaves whatever was written in place
    tokio::io::copy(&mut upload.file, &mut dst)
        .await
        .map_err(UploadError::Save)?;
    dst.flush().await.map_err(UploadError::Save)?;

    logger::log_info(&format!(
        "File uploaded successfully: {filename} (size: {} bytes)",
        upload.size
    ));

    Ok(http::build_text_response(
        StatusCode::OK,
        format!("File uploaded successfully: {filename}"),
    ))
}

fn extract_boundary<B>(req: &Request<B>) -> Result<String, UploadError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            UploadError::InvalidMultipart("request Content-Type isn't multipart/form-data".into())
        })?;

    multer::parse_boundary(content_type).map_err(|e| UploadError::InvalidMultipart(e.to_string()))
}

/// Read the whole multipart body, spooling the first `image` file part and
/// draining every other part.
async fn receive_file<B>(
    body: B,
    boundary: String,
    max_file_size: i64,
) -> Result<SpooledUpload, UploadError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let mut multipart = multer::Multipart::new(body.into_data_stream(), boundary);
    let mut upload: Option<SpooledUpload> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::InvalidMultipart(e.to_string()))?
    {
        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let wanted = upload.is_none() && field.name() == Some(FILE_FIELD);

        match file_name {
            Some(file_name) if wanted => {
                let mut file = create_spool().await?;
                let mut size: i64 = 0;

                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| UploadError::InvalidMultipart(e.to_string()))?
                {
                    size = size.saturating_add(i64::try_from(chunk.len()).unwrap_or(i64::MAX));
                    if size > max_file_size {
                        return Err(UploadError::TooLarge {
                            size,
                            max: max_file_size,
                        });
                    }
                    file.write_all(&chunk).await.map_err(UploadError::Spool)?;
                }

                file.flush().await.map_err(UploadError::Spool)?;
                file.rewind().await.map_err(UploadError::Spool)?;
                upload = Some(SpooledUpload {
                    file,
                    file_name,
                    size,
                });
            }
            _ => {
                while field
                    .chunk()
                    .await
                    .map_err(|e| UploadError::InvalidMultipart(e.to_string()))?
                    .is_some()
                {}
            }
        }
    }

    upload.ok_or_else(|| {
        UploadError::MissingFile(format!("no file part named '{FILE_FIELD}'"))
    })
}

/// Anonymous temporary file, created on the blocking pool
async fn create_spool() -> Result<File, UploadError> {
    let std_file = tokio::task::spawn_blocking(tempfile::tempfile)
        .await
        .map_err(|e| UploadError::Spool(std::io::Error::other(e)))?
        .map_err(UploadError::Spool)?;
    Ok(File::from_std(std_file))
}
