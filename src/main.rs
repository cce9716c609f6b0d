use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use vpn_speedtest::cli::{commands::handle_cli, Cli, Commands};
use vpn_speedtest::http_server::start_http_server;
use vpn_speedtest::utils::config::Config;
use vpn_speedtest::utils::metrics;
use vpn_speedtest::TransferService;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, scratch_dir } => {
            let mut cfg = Config::from_env()?;
            if let Some(bind) = bind {
                cfg.bind_addr = bind;
            }
            if let Some(dir) = scratch_dir {
                cfg.scratch_dir = dir;
            }
            info!("Starting speed test server, scratch dir: {}", cfg.scratch_dir.display());

            if let Some(port) = cfg.prometheus_port {
                metrics::install_exporter(port)?;
            }
            let service = TransferService::from_config(&cfg);
            start_http_server(&cfg, service).await
        }
        cmd => handle_cli(cmd, &cli.server).await,
    }
}
