use std::net::SocketAddr;

use anyhow::{Context, Result};
use log::info;
use metrics_exporter_prometheus::PrometheusBuilder;

pub const DOWNLOAD_REQUESTS: &str = "speedtest_download_requests_total";
pub const DOWNLOAD_BYTES: &str = "speedtest_download_bytes_total";
pub const UPLOAD_REQUESTS: &str = "speedtest_upload_requests_total";
pub const UPLOAD_BYTES: &str = "speedtest_upload_bytes_total";
pub const UPLOAD_REJECTED: &str = "speedtest_upload_rejected_total";
pub const UPLOAD_SECONDS: &str = "speedtest_upload_seconds";

/// Starts the Prometheus scrape endpoint. Without it the `metrics` macros are no-ops.
pub fn install_exporter(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("install prometheus exporter")?;
    info!("Prometheus metrics exposed on {}", addr);
    Ok(())
}
