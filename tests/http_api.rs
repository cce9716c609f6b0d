use std::path::Path;

use serde_json::Value;
use tempfile::TempDir;
use vpn_speedtest::routers::make_routes;
use vpn_speedtest::utils::config::Limits;
use vpn_speedtest::TransferService;
use warp::http::StatusCode;

const BOUNDARY: &str = "speedtest-boundary-7MA4YWxkTrZu0gW";

fn service() -> (TempDir, TransferService) {
    let dir = tempfile::tempdir().unwrap();
    let service = TransferService::new(dir.path(), Limits::default());
    (dir, service)
}

fn multipart_body(field: &str, filename: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn scratch_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

async fn upload(
    service: TransferService,
    query: &str,
    body: Vec<u8>,
) -> warp::http::Response<bytes::Bytes> {
    let routes = make_routes(service);
    warp::test::request()
        .method("POST")
        .path(&format!("/upload{query}"))
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(body)
        .reply(&routes)
        .await
}

#[tokio::test]
async fn root_lists_endpoints() {
    let (_dir, service) = service();
    let resp = warp::test::request().path("/").reply(&make_routes(service)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json(resp.body());
    assert_eq!(body["status"], "running");
    assert_eq!(body["endpoints"]["download"], "/download");
    assert_eq!(body["endpoints"]["upload"], "/upload");
    assert_eq!(body["endpoints"]["ping"], "/ping");
}

#[tokio::test]
async fn ping_and_health_report_timestamps() {
    let (_dir, service) = service();
    let routes = make_routes(service);

    let resp = warp::test::request().path("/ping").reply(&routes).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json(resp.body());
    assert_eq!(body["message"], "pong");
    assert!(body["timestamp"].as_f64().unwrap() > 0.0);

    let resp = warp::test::request().path("/health").reply(&routes).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json(resp.body());
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn download_streams_exactly_the_requested_size() {
    let (_dir, service) = service();
    let resp = warp::test::request()
        .path("/download?size=2097152")
        .reply(&make_routes(service))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["content-length"], "2097152");
    assert_eq!(headers["content-type"], "application/octet-stream");
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=speedtest_2097152.bin"
    );
    assert_eq!(headers["cache-control"], "no-cache, no-store, must-revalidate");
    assert_eq!(resp.body().len(), 2_097_152);
}

#[tokio::test]
async fn download_accepts_minimum_size() {
    let (_dir, service) = service();
    let resp = warp::test::request()
        .path("/download?size=1024")
        .reply(&make_routes(service))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.body().len(), 1024);
}

#[tokio::test]
async fn download_rejects_out_of_range_sizes() {
    let (_dir, service) = service();
    let routes = make_routes(service);
    for query in ["size=1023", "size=1073741825", "size=0", "size=abc", "size=-5"] {
        let resp = warp::test::request()
            .path(&format!("/download?{query}"))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "query {query}");
        assert!(json(resp.body())["detail"].is_string());
    }
}

#[tokio::test]
async fn repeated_downloads_are_independent() {
    let (_dir, service) = service();
    let routes = make_routes(service);
    let a = warp::test::request().path("/download?size=8192").reply(&routes).await;
    let b = warp::test::request().path("/download?size=8192").reply(&routes).await;
    assert_eq!(a.body().len(), b.body().len());
    assert_ne!(a.body(), b.body());
}

#[tokio::test]
async fn upload_of_expected_size_reports_speed() {
    let (dir, service) = service();
    let payload = vec![0x5Au8; 1_048_576];
    let resp = upload(
        service,
        "?expected_size=1048576",
        multipart_body("file", "payload.bin", &payload),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json(resp.body());
    assert_eq!(body["message"], "Upload successful");
    assert_eq!(body["filename"], "payload.bin");
    assert_eq!(body["size_bytes"], 1_048_576);
    assert!(body["upload_speed_bps"].as_f64().unwrap() > 0.0);
    assert!(body["upload_time_seconds"].as_f64().unwrap() >= 0.0);
    assert!(body["upload_speed_mbps"].is_number());
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn upload_twice_the_bound_is_rejected() {
    let (dir, service) = service();
    let payload = vec![0u8; 2_097_152];
    let resp = upload(
        service,
        "?expected_size=1048576",
        multipart_body("file", "big.bin", &payload),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn upload_one_byte_over_is_caught_while_streaming() {
    let (dir, service) = service();
    // small enough overshoot to pass the declared-length precheck
    let payload = vec![0u8; 1_048_577];
    let resp = upload(
        service,
        "?expected_size=1048576",
        multipart_body("file", "over.bin", &payload),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json(resp.body())["detail"],
        "File size 1048577 exceeds expected size 1048576"
    );
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn upload_uses_default_bound() {
    let (dir, service) = service();
    let payload = vec![1u8; 4096];
    let resp = upload(service, "", multipart_body("file", "small.bin", &payload)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json(resp.body())["size_bytes"], 4096);
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn upload_rejects_out_of_range_bound() {
    let (dir, service) = service();
    let payload = vec![1u8; 2048];
    for query in ["?expected_size=1023", "?expected_size=104857601"] {
        let body = multipart_body("file", "a.bin", &payload);
        let resp = upload(service.clone(), query, body).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "query {query}");
    }
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let (dir, service) = service();
    let resp = upload(
        service,
        "?expected_size=4096",
        multipart_body("attachment", "a.bin", &[0u8; 1024]),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json(resp.body())["detail"].as_str().unwrap().contains("file"));
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn upload_io_failure_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("not-created");
    let service = TransferService::new(&missing, Limits::default());
    let resp = upload(
        service,
        "?expected_size=4096",
        multipart_body("file", "a.bin", &[0u8; 4096]),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(resp.body())["detail"], "Upload failed");
    assert!(!missing.exists());
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let (_dir, service) = service();
    let resp = warp::test::request().path("/nope").reply(&make_routes(service)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
