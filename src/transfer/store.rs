use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, warn};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Write target that lives only for the duration of one upload.
///
/// `discard` must be idempotent. Implementations also release themselves on
/// drop so an abandoned upload never leaves anything behind.
#[async_trait]
pub trait TransientStore: Send {
    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Surfaces any write error still pending inside the store.
    async fn flush(&mut self) -> io::Result<()>;

    async fn discard(&mut self) -> io::Result<()>;
}

/// Per-upload file under the scratch directory, named by a fresh UUID.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: Option<File>,
}

impl FileStore {
    pub async fn create(scratch_dir: &Path) -> io::Result<Self> {
        let path = scratch_dir.join(format!("upload_{}.bin", Uuid::new_v4()));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        debug!("opened transient store {}", path.display());
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn closed() -> io::Error {
        io::Error::new(io::ErrorKind::BrokenPipe, "transient store already discarded")
    }
}

#[async_trait]
impl TransientStore for FileStore {
    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(Self::closed)?;
        file.write_all(chunk).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(Self::closed)?;
        file.flush().await
    }

    async fn discard(&mut self) -> io::Result<()> {
        if self.file.take().is_none() {
            return Ok(());
        }
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("removed transient store {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove transient store {}: {}", self.path.display(), e);
                }
            } else {
                debug!("removed abandoned transient store {}", self.path.display());
            }
        }
    }
}

/// In-memory buffer for exercising sinks without touching the filesystem.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    buf: Vec<u8>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
#[async_trait]
impl TransientStore for MemoryStore {
    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    async fn discard(&mut self) -> io::Result<()> {
        self.buf = Vec::new();
        Ok(())
    }
}
