use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;

use crate::error::TransferResult;
use crate::models::TransferRequest;
use crate::transfer::{self, check_declared, BoundedSink, FileStore, PayloadGenerator};
use crate::utils::config::{Config, Limits};

/// Builds generators and sinks from explicit configuration.
///
/// Cheap to clone; every request gets its own generator or sink and nothing
/// mutable is shared between them.
#[derive(Debug, Clone)]
pub struct TransferService {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    scratch_dir: PathBuf,
    limits: Limits,
}

impl TransferService {
    pub fn new(scratch_dir: impl Into<PathBuf>, limits: Limits) -> Self {
        Self {
            inner: Arc::new(Inner {
                scratch_dir: scratch_dir.into(),
                limits,
            }),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.scratch_dir.clone(), cfg.limits.clone())
    }

    pub fn limits(&self) -> &Limits {
        &self.inner.limits
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.inner.scratch_dir
    }

    /// Creates the scratch directory if it is missing.
    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.inner.scratch_dir).await?;
        info!("Scratch directory ready at {}", self.inner.scratch_dir.display());
        Ok(())
    }

    /// Resolves the requested download size (or the default) into a generator.
    pub fn download(&self, size: Option<u64>) -> TransferResult<PayloadGenerator> {
        let size = size.unwrap_or(self.inner.limits.default_download_size);
        PayloadGenerator::for_size(size, &self.inner.limits)
    }

    /// Validates the upload bound, applies the declared-size precheck and only
    /// then opens a transient store for the sink.
    pub async fn upload_sink(
        &self,
        expected_size: Option<u64>,
        declared: Option<u64>,
    ) -> TransferResult<BoundedSink<FileStore>> {
        let request = self.upload_request(expected_size)?;
        check_declared(declared, &request)?;
        let store = FileStore::create(&self.inner.scratch_dir).await?;
        Ok(BoundedSink::new(store, request))
    }

    pub fn upload_request(&self, expected_size: Option<u64>) -> TransferResult<TransferRequest> {
        let expected = expected_size.unwrap_or(self.inner.limits.default_upload_size);
        transfer::upload_request(expected, &self.inner.limits)
    }
}
