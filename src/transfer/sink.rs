use std::io;
use std::time::Instant;

use bytes::Buf;
use futures::{pin_mut, Stream, StreamExt};
use log::{debug, warn};

use super::store::TransientStore;
use crate::error::{TransferError, TransferResult};
use crate::models::{TransferOutcome, TransferRequest};

/// Best-effort rejection based on a size the client announced up front. The
/// running total checked by [`BoundedSink::write`] remains authoritative.
pub fn check_declared(declared: Option<u64>, request: &TransferRequest) -> TransferResult<()> {
    match declared {
        Some(size) if size > request.total_size => Err(TransferError::PayloadTooLarge {
            received: size,
            expected: request.total_size,
        }),
        _ => Ok(()),
    }
}

/// Accepts an inbound byte stream into a transient store, refusing to hold
/// more than `expected_size` bytes.
///
/// Every exit path releases the store: `finish` and `abort` remove it
/// explicitly, a failed `write` removes it before returning the error, and a
/// sink dropped mid-transfer relies on the store's own drop cleanup.
#[derive(Debug)]
pub struct BoundedSink<S: TransientStore> {
    store: S,
    expected_size: u64,
    chunk_size: usize,
    received: u64,
    started: Instant,
    failed: bool,
}

impl<S: TransientStore> BoundedSink<S> {
    /// Starts the clock. `request` must come from [`super::upload_request`].
    pub fn new(store: S, request: TransferRequest) -> Self {
        Self {
            store,
            expected_size: request.total_size,
            chunk_size: request.chunk_size,
            received: 0,
            started: Instant::now(),
            failed: false,
        }
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn expected_size(&self) -> u64 {
        self.expected_size
    }

    /// Writes `chunk` in pieces of at most `chunk_size`, checking the bound
    /// after each piece.
    pub async fn write(&mut self, chunk: &[u8]) -> TransferResult<()> {
        if self.failed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "upload already aborted").into());
        }
        for piece in chunk.chunks(self.chunk_size) {
            if let Err(e) = self.store.write_chunk(piece).await {
                self.fail().await;
                return Err(e.into());
            }
            self.received += piece.len() as u64;
            if self.received > self.expected_size {
                self.fail().await;
                return Err(TransferError::PayloadTooLarge {
                    received: self.received,
                    expected: self.expected_size,
                });
            }
        }
        Ok(())
    }

    /// Pulls every buffer out of `stream` into the sink, stopping at the
    /// first error from either side.
    pub async fn drain<St, B, E>(&mut self, stream: St) -> TransferResult<()>
    where
        St: Stream<Item = Result<B, E>>,
        B: Buf,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        pin_mut!(stream);
        while let Some(next) = stream.next().await {
            let bytes = match next {
                Ok(mut buf) => buf.copy_to_bytes(buf.remaining()),
                Err(e) => {
                    self.fail().await;
                    return Err(io::Error::new(io::ErrorKind::Other, e).into());
                }
            };
            self.write(&bytes).await?;
        }
        Ok(())
    }

    /// Stops the clock, removes the store and reports what arrived.
    pub async fn finish(mut self) -> TransferResult<TransferOutcome> {
        let elapsed = self.started.elapsed();
        if let Err(e) = self.store.flush().await {
            self.fail().await;
            return Err(e.into());
        }
        self.store.discard().await?;
        debug!("sink finished: {} bytes in {:?}", self.received, elapsed);
        Ok(TransferOutcome::new(self.received, elapsed))
    }

    pub async fn abort(mut self) {
        self.fail().await;
    }

    async fn fail(&mut self) {
        self.failed = true;
        if let Err(e) = self.store.discard().await {
            warn!("Failed to discard partial upload: {}", e);
        }
    }
}
