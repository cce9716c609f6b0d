use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::TransferOutcome;

#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub message: String,
    pub endpoints: BTreeMap<String, String>,
    pub status: String,
}

impl InfoResponse {
    pub fn running() -> Self {
        let endpoints = [
            ("download", "/download"),
            ("upload", "/upload"),
            ("ping", "/ping"),
            ("health", "/health"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            message: "VPN Speed Test Backend".to_string(),
            endpoints,
            status: "running".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
    pub timestamp: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub size_bytes: u64,
    pub upload_time_seconds: f64,
    pub upload_speed_bps: f64,
    pub upload_speed_mbps: f64,
}

impl UploadResponse {
    pub fn from_outcome(filename: String, outcome: &TransferOutcome) -> Self {
        Self {
            message: "Upload successful".to_string(),
            filename,
            size_bytes: outcome.bytes_transferred,
            upload_time_seconds: round_to(outcome.elapsed_seconds, 3),
            upload_speed_bps: round_to(outcome.throughput_bytes_per_second, 2),
            upload_speed_mbps: round_to(outcome.throughput_mib_per_second(), 2),
        }
    }
}

/// Body of every non-2xx reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
