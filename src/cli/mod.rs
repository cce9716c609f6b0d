use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;

const MIB: u64 = 1024 * 1024;

#[derive(Parser)]
#[command(name = "vpn-speedtest")]
#[command(about = "Throughput and latency measurement for VPN tunnels", long_about = None)]
pub struct Cli {
    /// Base URL of the speed-test server, used by the client commands
    #[arg(short, long, global = true, default_value = "http://127.0.0.1:8000")]
    pub server: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        #[arg(short, long)]
        bind: Option<SocketAddr>,
        #[arg(long)]
        scratch_dir: Option<PathBuf>,
    },
    /// Measure round-trip latency against /ping
    Ping {
        #[arg(short, long, default_value_t = 5)]
        count: u32,
    },
    /// Stream a download and report throughput
    Download {
        #[arg(long, default_value_t = 10 * MIB)]
        size: u64,
    },
    /// Upload a random payload and report throughput
    Upload {
        #[arg(long, default_value_t = 5 * MIB)]
        size: u64,
    },
    /// Check every endpoint of one or more servers
    Run {
        /// Extra servers checked after --server
        servers: Vec<String>,
    },
}
