//! Multipart upload handling

use std::path::Path;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Request};
use log::debug;
use tokio::io::AsyncWriteExt;
use crate::error::{WavConvError, Result};
use crate::processing::BatchInput;

const FALLBACK_NAME: &str = "upload.wav";

/// Reduce a client-supplied file name to a safe single path component.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let cleaned = cleaned.trim().trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Stream every file part of a multipart request into `scratch`.
///
/// Parts without a file name (plain form fields) and empty file inputs are
/// skipped.
pub async fn receive_files(req: Request<Body>, scratch: &Path, limit: u64) -> Result<Vec<BatchInput>> {
    let boundary = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| WavConvError::server("expected a multipart/form-data upload"))?;

    let constraints = multer::Constraints::new()
        .size_limit(multer::SizeLimit::new().whole_stream(limit));
    let mut multipart = multer::Multipart::with_constraints(req.into_body(), boundary, constraints);

    let mut inputs = Vec::new();
    let mut total = 0u64;
    while let Some(mut field) = multipart.next_field().await? {
        let name = match field.file_name() {
            Some(name) if !name.trim().is_empty() => sanitize_filename(name),
            _ => continue,
        };

        let path = scratch.join(format!("upload-{}", inputs.len()));
        let mut file = tokio::fs::File::create(&path).await?;
        let mut written = 0u64;
        while let Some(chunk) = field.chunk().await? {
            written += chunk.len() as u64;
            total += chunk.len() as u64;
            if total > limit {
                return Err(WavConvError::TooLarge { limit });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!("Received {} ({} bytes)", name, written);
        inputs.push(BatchInput::new(name, path));
    }

    Ok(inputs)
}
