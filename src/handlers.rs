use futures::{pin_mut, StreamExt};
use log::{error, info, warn};
use serde::Deserialize;
use warp::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use warp::http::{Response, StatusCode};
use warp::hyper::Body;
use warp::multipart::FormData;
use warp::{reject, reply, Rejection, Reply};

use crate::error::TransferError;
use crate::models::{HealthResponse, InfoResponse, PingResponse, UploadResponse};
use crate::probe::server_timestamp;
use crate::routers::errors::ApiError;
use crate::services::TransferService;
use crate::utils::metrics::{
    DOWNLOAD_BYTES, DOWNLOAD_REQUESTS, UPLOAD_BYTES, UPLOAD_REJECTED, UPLOAD_REQUESTS,
    UPLOAD_SECONDS,
};

/// Room left in a multipart body for boundaries and part headers on top of the
/// file bytes themselves.
pub const MULTIPART_FRAMING_ALLOWANCE: u64 = 64 * 1024;

const UPLOAD_FIELD: &str = "file";
const FALLBACK_FILENAME: &str = "upload.bin";

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub expected_size: Option<u64>,
}

pub async fn info() -> Result<impl Reply, Rejection> {
    Ok(reply::json(&InfoResponse::running()))
}

pub async fn ping() -> Result<impl Reply, Rejection> {
    Ok(reply::json(&PingResponse {
        message: "pong".to_string(),
        timestamp: server_timestamp(),
    }))
}

pub async fn health() -> Result<impl Reply, Rejection> {
    Ok(reply::json(&HealthResponse {
        status: "healthy".to_string(),
        timestamp: server_timestamp(),
    }))
}

/// Streams `size` random bytes. The length is announced up front; a client
/// that disconnects early just stops the body from being polled.
pub async fn download_file(
    service: TransferService,
    params: DownloadParams,
) -> Result<impl Reply, Rejection> {
    let generator = service
        .download(params.size)
        .map_err(|e| reject_transfer(e, "Download failed"))?;
    let size = generator.total_size();
    info!(
        "Starting download request for {} bytes in {} chunks",
        size,
        generator.chunk_count()
    );
    metrics::counter!(DOWNLOAD_REQUESTS).increment(1);

    let body = generator
        .into_stream()
        .inspect(|chunk| {
            if let Ok(chunk) = chunk {
                metrics::counter!(DOWNLOAD_BYTES).increment(chunk.len() as u64);
            }
        });

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/octet-stream")
        .header(CONTENT_DISPOSITION, format!("attachment; filename=speedtest_{size}.bin"))
        .header(CONTENT_LENGTH, size)
        .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .body(Body::wrap_stream(body))
        .map_err(|e| {
            error!("Download error: {}", e);
            reject::custom(ApiError::internal("Download failed"))
        })
}

/// Receives the multipart `file` field into a bounded sink and reports the
/// measured upload speed.
pub async fn upload_file(
    service: TransferService,
    params: UploadParams,
    content_length: Option<u64>,
    form: FormData,
) -> Result<impl Reply, Rejection> {
    metrics::counter!(UPLOAD_REQUESTS).increment(1);
    let declared = content_length.map(|len| len.saturating_sub(MULTIPART_FRAMING_ALLOWANCE));
    let mut sink = service
        .upload_sink(params.expected_size, declared)
        .await
        .map_err(|e| reject_transfer(e, "Upload failed"))?;

    pin_mut!(form);
    while let Some(part) = form.next().await {
        let part = match part {
            Ok(part) => part,
            Err(e) => {
                sink.abort().await;
                return Err(reject::custom(ApiError::bad_request(format!(
                    "malformed multipart body: {e}"
                ))));
            }
        };
        if part.name() != UPLOAD_FIELD {
            continue;
        }
        let filename = part.filename().unwrap_or(FALLBACK_FILENAME).to_string();
        info!("Starting upload request for file: {}", filename);

        sink.drain(part.stream()).await.map_err(|e| reject_transfer(e, "Upload failed"))?;
        let outcome = sink.finish().await.map_err(|e| reject_transfer(e, "Upload failed"))?;

        info!(
            "Upload completed: {} bytes in {:.2}s",
            outcome.bytes_transferred, outcome.elapsed_seconds
        );
        metrics::counter!(UPLOAD_BYTES).increment(outcome.bytes_transferred);
        metrics::histogram!(UPLOAD_SECONDS).record(outcome.elapsed_seconds);
        return Ok(reply::json(&UploadResponse::from_outcome(filename, &outcome)));
    }

    sink.abort().await;
    Err(reject::custom(ApiError::bad_request(format!(
        "multipart field `{UPLOAD_FIELD}` is required"
    ))))
}

fn reject_transfer(err: TransferError, failure: &str) -> Rejection {
    match &err {
        TransferError::PayloadTooLarge { .. } => {
            warn!("{}", err);
            metrics::counter!(UPLOAD_REJECTED).increment(1);
        }
        TransferError::InvalidArgument(_) => warn!("Rejected request: {}", err),
        TransferError::Io(_) => error!("{}: {}", failure, err),
    }
    reject::custom(ApiError::from_transfer(err, failure))
}
