use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};

use super::Commands;
use crate::models::{InfoResponse, PingResponse, TransferOutcome, UploadResponse};
use crate::transfer::PayloadGenerator;
use crate::utils::config::Limits;

const RUN_DOWNLOAD_SIZE: u64 = 10 * 1024 * 1024;
const RUN_UPLOAD_SIZE: u64 = 5 * 1024 * 1024;

/// Thin HTTP client for the speed-test endpoints.
pub struct SpeedTestClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Clone, Copy)]
pub struct LatencyStats {
    pub min: Duration,
    pub avg: Duration,
    pub max: Duration,
}

impl SpeedTestClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn info(&self) -> Result<InfoResponse> {
        let resp = self.client.get(format!("{}/", self.base_url)).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    pub async fn ping(&self) -> Result<Duration> {
        let start = Instant::now();
        let resp = self
            .client
            .get(format!("{}/ping", self.base_url))
            .timeout(Duration::from_secs(10))
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let body: PingResponse = resp.json().await?;
        let rtt = start.elapsed();
        if body.message != "pong" {
            bail!("unexpected ping reply `{}`", body.message);
        }
        Ok(rtt)
    }

    pub async fn ping_series(&self, count: u32) -> Result<LatencyStats> {
        if count == 0 {
            bail!("ping count must be at least 1");
        }
        let mut samples = Vec::with_capacity(count as usize);
        for _ in 0..count {
            samples.push(self.ping().await?);
        }
        let total: Duration = samples.iter().sum();
        Ok(LatencyStats {
            min: samples.iter().copied().min().unwrap_or_default(),
            avg: total / count,
            max: samples.iter().copied().max().unwrap_or_default(),
        })
    }

    /// Streams `/download?size=` and counts what arrives; nothing is kept.
    pub async fn download(&self, size: u64) -> Result<TransferOutcome> {
        let start = Instant::now();
        let resp = self
            .client
            .get(format!("{}/download", self.base_url))
            .query(&[("size", size)])
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let mut received = 0u64;
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            received += chunk.context("read download body")?.len() as u64;
        }
        let outcome = TransferOutcome::new(received, start.elapsed());
        if received != size {
            bail!("expected {} bytes, received {}", size, received);
        }
        Ok(outcome)
    }

    /// Uploads `size` freshly generated random bytes as the multipart `file` field.
    pub async fn upload(&self, size: u64) -> Result<(TransferOutcome, UploadResponse)> {
        let payload = PayloadGenerator::for_size(size, &Limits::default())?;
        let part = Part::stream_with_length(Body::wrap_stream(payload.into_stream()), size)
            .file_name(format!("test_upload_{size}.bin"))
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("file", part);

        let start = Instant::now();
        let resp = self
            .client
            .post(format!("{}/upload", self.base_url))
            .query(&[("expected_size", size)])
            .multipart(form)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let report: UploadResponse = resp.json().await?;
        Ok((TransferOutcome::new(size, start.elapsed()), report))
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(anyhow!("server returned {}: {}", status, body))
}

pub async fn handle_cli(cmd: Commands, server: &str) -> Result<()> {
    let client = SpeedTestClient::new(server)?;
    match cmd {
        Commands::Serve { .. } => bail!("serve is handled by the server entry point"),
        Commands::Ping { count } => {
            let stats = client.ping_series(count).await?;
            println!(
                "Latency over {} pings: min {:.2}ms / avg {:.2}ms / max {:.2}ms",
                count,
                millis(stats.min),
                millis(stats.avg),
                millis(stats.max)
            );
        }
        Commands::Download { size } => {
            let outcome = client.download(size).await?;
            print_outcome("Download", &outcome);
        }
        Commands::Upload { size } => {
            let (outcome, report) = client.upload(size).await?;
            print_outcome("Upload", &outcome);
            println!(
                "   Server measured {} bytes in {:.3}s ({:.2} MiB/s)",
                report.size_bytes, report.upload_time_seconds, report.upload_speed_mbps
            );
        }
        Commands::Run { servers } => {
            let mut targets = vec![server.to_string()];
            targets.extend(servers);
            let mut failed = 0;
            for target in &targets {
                let client = SpeedTestClient::new(target)?;
                failed += run_checks(&client).await;
            }
            if failed > 0 {
                bail!("{} check(s) failed", failed);
            }
            println!("All checks passed.");
        }
    }
    Ok(())
}

/// Runs the full endpoint suite against one server and returns how many checks failed.
async fn run_checks(client: &SpeedTestClient) -> usize {
    println!("Testing server: {}", client.base_url());
    let mut results: Vec<(&str, Result<String>)> = Vec::new();

    results.push(("root", client.info().await.map(|info| info.status)));
    results.push((
        "ping",
        client.ping().await.map(|rtt| format!("{:.2}ms", millis(rtt))),
    ));
    results.push((
        "download",
        client
            .download(RUN_DOWNLOAD_SIZE)
            .await
            .map(|o| format!("{:.2} MiB/s", o.throughput_mib_per_second())),
    ));
    results.push((
        "upload",
        client
            .upload(RUN_UPLOAD_SIZE)
            .await
            .map(|(o, _)| format!("{:.2} MiB/s", o.throughput_mib_per_second())),
    ));

    let mut failed = 0;
    for (name, result) in &results {
        match result {
            Ok(detail) => println!("{:12} : PASS ({})", name.to_uppercase(), detail),
            Err(e) => {
                failed += 1;
                println!("{:12} : FAIL ({})", name.to_uppercase(), e);
            }
        }
    }
    println!("Results: {}/{} checks passed", results.len() - failed, results.len());
    failed
}

fn print_outcome(label: &str, outcome: &TransferOutcome) {
    println!(
        "{} successful - {} bytes in {:.2}s",
        label, outcome.bytes_transferred, outcome.elapsed_seconds
    );
    println!("   Speed: {:.2} MiB/s", outcome.throughput_mib_per_second());
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
