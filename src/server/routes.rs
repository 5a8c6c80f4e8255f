//! Request routing and handlers

use hyper::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use log::{error, info, warn};
use uuid::Uuid;
use crate::error::{WavConvError, Result};
use crate::processing::BatchConverter;
use crate::server::{page, upload, ServerState};

const DOWNLOAD_PREFIX: &str = "/download/";

pub async fn handle(req: Request<Body>, state: &ServerState) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    info!("{} {}", method, path);

    match (&method, path.as_str()) {
        (&Method::GET, "/") => html(StatusCode::OK, page::index()),
        (&Method::POST, "/convert") => match convert(req, state).await {
            Ok(response) => response,
            Err(e) => error_response(&e),
        },
        (&Method::GET, p) if p.starts_with(DOWNLOAD_PREFIX) => {
            download(&p[DOWNLOAD_PREFIX.len()..], state).await
        }
        _ => html(StatusCode::NOT_FOUND, page::error("Not found")),
    }
}

/// Download link for a converted file.
pub fn download_href(request_id: &Uuid, file_name: &str) -> String {
    format!("{}{}/{}", DOWNLOAD_PREFIX, request_id, urlencoding::encode(file_name))
}

async fn convert(req: Request<Body>, state: &ServerState) -> Result<Response<Body>> {
    let config = &state.config;

    // Uploads live only as long as this request.
    let scratch = tempfile::TempDir::new()?;
    let inputs = upload::receive_files(req, scratch.path(), config.server.max_upload_bytes).await?;

    state.sweep_outputs().await;

    let request_id = Uuid::new_v4();
    let batch = BatchConverter::from_config(config)
        .with_output_dir(config.output.dir.join(request_id.to_string()));
    let report = batch.convert_all(&inputs)?;

    let downloads: Vec<(String, String)> = report
        .results
        .iter()
        .filter_map(|r| r.output_name.as_ref())
        .map(|name| (download_href(&request_id, name), name.clone()))
        .collect();

    Ok(html(StatusCode::OK, page::result(&report.render(), &downloads)))
}

async fn download(rest: &str, state: &ServerState) -> Response<Body> {
    let not_found = || html(StatusCode::NOT_FOUND, page::error("File not found"));

    let Some((id, encoded_name)) = rest.split_once('/') else {
        return not_found();
    };
    let Ok(request_id) = Uuid::parse_str(id) else {
        return not_found();
    };
    let Ok(name) = urlencoding::decode(encoded_name) else {
        return not_found();
    };
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        warn!("Rejected download name {:?}", name);
        return not_found();
    }

    let path = state
        .config
        .output
        .dir
        .join(request_id.to_string())
        .join(&*name);

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            let headers = response.headers_mut();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
            let disposition = format!("attachment; filename=\"{}\"", name.replace('"', "_"));
            headers.insert(
                CONTENT_DISPOSITION,
                HeaderValue::from_str(&disposition).unwrap_or_else(|_| HeaderValue::from_static("attachment")),
            );
            response
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => not_found(),
        Err(e) => {
            error!("Cannot read {}: {}", path.display(), e);
            html(StatusCode::INTERNAL_SERVER_ERROR, page::error("Cannot read converted file"))
        }
    }
}

fn error_response(err: &WavConvError) -> Response<Body> {
    let status = match err {
        WavConvError::NoInput | WavConvError::Server { .. } | WavConvError::Format { .. } => {
            StatusCode::BAD_REQUEST
        }
        WavConvError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        WavConvError::Io { .. } | WavConvError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!("Conversion request failed ({}): {}", status, err);
    html(status, page::error(&err.to_string()))
}

fn html(status: StatusCode, body: String) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
    response
}
