use warp::Filter;

use crate::handlers::{self, DownloadParams, UploadParams};
use crate::services::TransferService;

pub fn make_routes(
    service: TransferService,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    let service_filter = warp::any().map(move || service.clone());

    let info = warp::path::end().and(warp::get()).and_then(handlers::info);

    let ping = warp::path("ping")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::ping);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::health);

    let download = warp::path("download")
        .and(warp::path::end())
        .and(warp::get())
        .and(service_filter.clone())
        .and(warp::query::<DownloadParams>())
        .and_then(handlers::download_file);

    let upload = warp::path("upload")
        .and(warp::path::end())
        .and(warp::post())
        .and(service_filter.clone())
        .and(warp::query::<UploadParams>())
        .and(warp::header::optional::<u64>("content-length"))
        // no body cap here: chunked uploads carry no length, and the sink
        // enforces `expected_size` on the running total
        .and(warp::multipart::form().max_length(None))
        .and_then(handlers::upload_file);

    info.or(ping)
        .or(health)
        .or(download)
        .or(upload)
        .recover(errors::handle_rejection)
        .with(warp::log("vpn_speedtest::http"))
}

pub mod errors {
    use std::convert::Infallible;

    use log::debug;
    use warp::http::StatusCode;
    use warp::reject::{self, Reject};
    use warp::{reply, Rejection, Reply};

    use crate::error::TransferError;
    use crate::models::ErrorBody;

    #[derive(Debug)]
    pub struct ApiError {
        pub status: StatusCode,
        pub detail: String,
    }

    impl Reject for ApiError {}

    impl ApiError {
        pub fn bad_request(detail: impl Into<String>) -> Self {
            Self {
                status: StatusCode::BAD_REQUEST,
                detail: detail.into(),
            }
        }

        pub fn internal(detail: impl Into<String>) -> Self {
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: detail.into(),
            }
        }

        /// Client mistakes keep their message; I/O failures only expose `failure`.
        pub fn from_transfer(err: TransferError, failure: &str) -> Self {
            if err.is_client_error() {
                Self::bad_request(err.to_string())
            } else {
                Self::internal(failure)
            }
        }
    }

    pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
        let (status, detail) = if err.is_not_found() {
            (StatusCode::NOT_FOUND, "Not Found".to_string())
        } else if let Some(e) = err.find::<ApiError>() {
            (e.status, e.detail.clone())
        } else if let Some(e) = err.find::<reject::InvalidQuery>() {
            (StatusCode::BAD_REQUEST, e.to_string())
        } else if let Some(e) = err.find::<reject::InvalidHeader>() {
            (StatusCode::BAD_REQUEST, e.to_string())
        } else if let Some(e) = err.find::<reject::MissingHeader>() {
            (StatusCode::BAD_REQUEST, e.to_string())
        } else if let Some(e) = err.find::<reject::UnsupportedMediaType>() {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string())
        } else if let Some(e) = err.find::<reject::MethodNotAllowed>() {
            (StatusCode::METHOD_NOT_ALLOWED, e.to_string())
        } else {
            debug!("unhandled rejection: {:?}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
        };
        Ok(reply::with_status(reply::json(&ErrorBody { detail }), status))
    }
}
