use std::convert::Infallible;

use bytes::Bytes;
use futures::stream::{self, Stream};
use log::debug;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::TransferResult;
use crate::models::TransferRequest;
use crate::utils::config::Limits;

/// Lazily produces `total_size` bytes of OS-sourced random data, one chunk at
/// a time. Consumed once; there is no way to rewind it.
#[derive(Debug)]
pub struct PayloadGenerator {
    request: TransferRequest,
    remaining: u64,
}

impl PayloadGenerator {
    pub fn new(request: TransferRequest) -> Self {
        Self {
            remaining: request.total_size,
            request,
        }
    }

    /// Validates `size` against the download bounds before anything is produced.
    pub fn for_size(size: u64, limits: &Limits) -> TransferResult<Self> {
        super::download_request(size, limits).map(Self::new)
    }

    pub fn total_size(&self) -> u64 {
        self.request.total_size
    }

    pub fn chunk_count(&self) -> u64 {
        self.request.chunk_count()
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Adapts the generator into a body stream. The next chunk is generated
    /// only when the consumer polls for it.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
        stream::iter(self.map(Ok))
    }
}

impl Iterator for PayloadGenerator {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        if self.remaining == 0 {
            return None;
        }
        let len = self.remaining.min(self.request.chunk_size as u64) as usize;
        let mut chunk = vec![0u8; len];
        OsRng.fill_bytes(&mut chunk);
        self.remaining -= len as u64;
        Some(Bytes::from(chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let chunk = self.request.chunk_size as u64;
        let left = usize::try_from(self.remaining.div_ceil(chunk)).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}

impl Drop for PayloadGenerator {
    fn drop(&mut self) {
        if self.remaining > 0 && self.remaining < self.request.total_size {
            debug!(
                "download abandoned after {} of {} bytes",
                self.request.total_size - self.remaining,
                self.request.total_size
            );
        }
    }
}
