use std::time::Duration;

pub mod api;

pub use api::{ErrorBody, HealthResponse, InfoResponse, PingResponse, UploadResponse};

/// Size parameters of one transfer, built per request after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub total_size: u64,
    pub chunk_size: usize,
}

impl TransferRequest {
    pub fn new(total_size: u64, chunk_size: usize) -> Self {
        Self {
            total_size,
            chunk_size,
        }
    }

    /// Number of chunks needed to cover `total_size`.
    pub fn chunk_count(&self) -> u64 {
        self.total_size.div_ceil(self.chunk_size as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferOutcome {
    pub bytes_transferred: u64,
    pub elapsed_seconds: f64,
    pub throughput_bytes_per_second: f64,
}

impl TransferOutcome {
    pub fn new(bytes_transferred: u64, elapsed: Duration) -> Self {
        let elapsed_seconds = elapsed.as_secs_f64();
        let throughput_bytes_per_second = if elapsed_seconds > 0.0 {
            bytes_transferred as f64 / elapsed_seconds
        } else {
            0.0
        };
        Self {
            bytes_transferred,
            elapsed_seconds,
            throughput_bytes_per_second,
        }
    }

    pub fn throughput_mib_per_second(&self) -> f64 {
        self.throughput_bytes_per_second / (1024.0 * 1024.0)
    }
}
