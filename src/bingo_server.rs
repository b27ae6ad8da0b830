// src/bingo_server.rs
// Entry point for the bingo page server.

use std::sync::atomic::Ordering;

use clap::Parser;
use url::Url;

use location_bingo::config::ServerConfig;
use location_bingo::logging::{LogLevel, log_error_stderr, log_info, set_log_level};
use location_bingo::server;

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Location Bingo Server - Serve the shareable bingo card")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Address to bind, overrides conf/server.conf
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overrides conf/server.conf
    #[arg(long)]
    port: Option<u16>,

    /// Origin used in share links and QR codes
    #[arg(long)]
    public_url: Option<Url>,

    /// debug, info, warning or error
    #[arg(long)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = ServerConfig::load_or_default();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.public_url.is_some() {
        config.public_url = args.public_url;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    set_log_level(config.log_level);

    let (server_handle, shutdown_signal) = server::start_server(config);

    if let Err(e) = tokio::signal::ctrl_c().await {
        log_error_stderr(&format!("Failed to listen for Ctrl+C: {e}"));
    }

    // Signal the server to shutdown
    shutdown_signal.store(true, Ordering::Relaxed);

    if let Err(e) = server_handle.await {
        log_error_stderr(&format!("Error waiting for server shutdown: {e:?}"));
    }

    log_info("Server stopped.");
}
