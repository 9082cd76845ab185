//! Vortex demo server.
//!
//! Serves the demo frontend, a cookie-based demo login backed by stateless
//! session tokens, and proxy routes for Vortex invitation management that
//! fall back to canned responses when no API key is configured.

mod config;
mod error;
mod handlers;
mod routes;
mod server;
mod session;
mod state;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::{Cli, ServerConfig};
use server::Server;

/// Rolling log file name prefix inside `LOG_DIR`
const LOG_FILE_PREFIX: &str = "vortex-demo.log";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer on drop and must be held
/// until the process exits.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from(Cli::parse());
    let _log_guard = init_tracing(config.log_dir.as_deref());
    info!(version = env!("CARGO_PKG_VERSION"), "Vortex demo server starting");

    Server::new(config)?.run().await
}
