//! Chat relay server entry point.
//!
//! # Usage
//!
//! ```text
//! chat-server [OPTIONS]
//!
//! Options:
//!   --config <PATH>   TOML config file (optional)
//!   --bind   <IP>     Listen address [default from file, else 127.0.0.1]
//!   --port   <PORT>   Listen port    [default from file, else 8000]
//! ```
//!
//! # Precedence
//!
//! Command-line flags (or their environment variables) override the config
//! file, which overrides the built-in defaults.
//!
//! | Variable      | Flag       |
//! |---------------|------------|
//! | `CHAT_CONFIG` | `--config` |
//! | `CHAT_BIND`   | `--bind`   |
//! | `CHAT_PORT`   | `--port`   |
//!
//! `RUST_LOG` takes precedence over the file's `log_level`.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_server::infrastructure::storage::config::{load_config, FileConfig};
use chat_server::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Text chat relay server.
#[derive(Debug, Parser)]
#[command(name = "chat-server", about = "Multi-user text chat relay", version)]
struct Cli {
    /// Path to a TOML config file with a `[server]` table.
    #[arg(long, env = "CHAT_CONFIG")]
    config: Option<PathBuf>,

    /// IP address to listen on.
    #[arg(long, env = "CHAT_BIND")]
    bind: Option<String>,

    /// TCP port to listen on.
    #[arg(long, env = "CHAT_PORT")]
    port: Option<u16>,
}

impl Cli {
    /// Loads the config file (if any) and applies the command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    fn into_file_config(self) -> anyhow::Result<FileConfig> {
        let mut file = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => FileConfig::default(),
        };
        if let Some(bind) = self.bind {
            file.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            file.server.port = port;
        }
        Ok(file)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let file = Cli::parse().into_file_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&file.server.log_level)),
        )
        .init();

    let config = file
        .to_server_config()
        .context("invalid server configuration")?;
    info!("chat server starting on {}", config.bind_addr);

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; initiating graceful shutdown");
                running_clone.store(false, Ordering::SeqCst);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_server(config, running).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
