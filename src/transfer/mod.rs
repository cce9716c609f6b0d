//! Bounded streaming transfer engine.
//!
//! Downloads pull random chunks out of a [`PayloadGenerator`]; uploads push
//! inbound chunks into a [`BoundedSink`] backed by a [`TransientStore`]. Both
//! sides handle one chunk at a time, so peak memory per transfer stays at a
//! single chunk regardless of the total size.

pub mod generator;
pub mod sink;
pub mod store;

pub use generator::PayloadGenerator;
pub use sink::{check_declared, BoundedSink};
pub use store::{FileStore, TransientStore};

use crate::error::{TransferError, TransferResult};
use crate::models::TransferRequest;
use crate::utils::config::Limits;

/// Validates a download size and pairs it with the configured chunk size.
pub fn download_request(size: u64, limits: &Limits) -> TransferResult<TransferRequest> {
    check_range("size", size, limits.min_size, limits.max_download_size)?;
    Ok(TransferRequest::new(size, limits.chunk_size))
}

/// Validates the upper bound an upload will be held to.
pub fn upload_request(expected_size: u64, limits: &Limits) -> TransferResult<TransferRequest> {
    check_range("expected_size", expected_size, limits.min_size, limits.max_upload_size)?;
    Ok(TransferRequest::new(expected_size, limits.chunk_size))
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> TransferResult<()> {
    if value < min || value > max {
        return Err(TransferError::out_of_range(name, value, min, max));
    }
    Ok(())
}
