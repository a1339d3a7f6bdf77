//! leetreview - command line client for the spaced-repetition service.
//!
//! Tracks LeetCode problems and the daily review queue. The stored token
//! is checked against the server on every start; if it has been revoked
//! the client falls back to signed-out.

mod commands;
mod format;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use leetreview_core::{Config, RedirectSlot, SessionManager};

use commands::{Command, Context};

/// Enables the daily log file in the data directory when set
const ENV_LOG_FILE: &str = "LEETREVIEW_LOG_FILE";

const LOG_FILE_PREFIX: &str = "leetreview.log";

#[derive(Parser, Debug)]
#[command(name = "leetreview", version, about = "Spaced-repetition review of LeetCode problems")]
struct Cli {
    /// API host, e.g. http://localhost:8000
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Initialize the tracing subscriber for logging. The returned guard
/// flushes the log file on drop.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // RUST_LOG controls the level (e.g. RUST_LOG=leetreview_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
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

    let cli = Cli::parse();

    let (mut config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let log_dir = std::env::var_os(ENV_LOG_FILE)
        .and_then(|_| config.data_dir().ok())
        .map(|dir| dir.join("logs"));
    let _log_guard = init_tracing(log_dir);

    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }
    for warning in config.apply_env() {
        warn!("{}", warning);
    }
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    debug!(api = %config.api_base_url, backend = %config.token_backend, "Starting");

    let gateway = Arc::new(config.gateway()?);
    let redirects = Arc::new(RedirectSlot::new());
    let session = SessionManager::new(gateway, redirects.clone());
    session.initialize().await;
    // The startup check has no page to leave yet
    redirects.take();

    let mut ctx = Context {
        session,
        redirects,
        config,
    };
    commands::run(&mut ctx, cli.command).await
}
