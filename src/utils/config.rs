use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenv::dotenv;

pub const CHUNK_SIZE: usize = 64 * 1024; // 64KB
pub const MIN_TRANSFER_SIZE: u64 = 1024; // 1KB
pub const MAX_DOWNLOAD_SIZE: u64 = 1024 * 1024 * 1024; // 1GB
pub const MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024; // 100MB
pub const DEFAULT_DOWNLOAD_SIZE: u64 = 100 * 1024 * 1024;
pub const DEFAULT_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_SCRATCH_DIR: &str = "/tmp/speedtest";

/// Size bounds shared by every transfer the service handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    pub chunk_size: usize,
    pub min_size: u64,
    pub max_download_size: u64,
    pub max_upload_size: u64,
    pub default_download_size: u64,
    pub default_upload_size: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            min_size: MIN_TRANSFER_SIZE,
            max_download_size: MAX_DOWNLOAD_SIZE,
            max_upload_size: MAX_UPLOAD_SIZE,
            default_download_size: DEFAULT_DOWNLOAD_SIZE,
            default_upload_size: DEFAULT_UPLOAD_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub scratch_dir: PathBuf,
    pub prometheus_port: Option<u16>,
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            prometheus_port: None,
            limits: Limits::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let bind_addr = env::var("SPEEDTEST_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind_addr = bind_addr
            .parse()
            .with_context(|| format!("invalid SPEEDTEST_BIND `{bind_addr}`"))?;
        let scratch_dir = env::var("SPEEDTEST_SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCRATCH_DIR));
        let prometheus_port = optional_var("PROMETHEUS_PORT")?;

        let mut limits = Limits::default();
        if let Some(size) = optional_var::<u64>("SPEEDTEST_DEFAULT_DOWNLOAD_SIZE")? {
            limits.default_download_size = size;
        }
        if let Some(size) = optional_var::<u64>("SPEEDTEST_DEFAULT_UPLOAD_SIZE")? {
            limits.default_upload_size = size;
        }

        let cfg = Self {
            bind_addr,
            scratch_dir,
            prometheus_port,
            limits,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let l = &self.limits;
        if !(l.min_size..=l.max_download_size).contains(&l.default_download_size) {
            anyhow::bail!(
                "default download size {} outside {}..={}",
                l.default_download_size,
                l.min_size,
                l.max_download_size
            );
        }
        if !(l.min_size..=l.max_upload_size).contains(&l.default_upload_size) {
            anyhow::bail!(
                "default upload size {} outside {}..={}",
                l.default_upload_size,
                l.min_size,
                l.max_upload_size
            );
        }
        Ok(())
    }
}

fn optional_var<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid {key} `{raw}`")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_bounds() {
        let cfg = Config::default();
        assert_eq!(cfg.limits.chunk_size, 65536);
        assert_eq!(cfg.limits.default_download_size, 104_857_600);
        assert_eq!(cfg.limits.default_upload_size, 10_485_760);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_default_outside_bounds() {
        let mut cfg = Config::default();
        cfg.limits.default_upload_size = MAX_UPLOAD_SIZE + 1;
        assert!(cfg.validate().is_err());
    }
}
