//! Chat relay console client.
//!
//! # Usage
//!
//! ```text
//! chat-client [OPTIONS]
//!
//! Options:
//!   --host <IP>     Server address [default: 127.0.0.1]
//!   --port <PORT>   Server port    [default: 8000]
//!   --name <NAME>   Display name (prompted for when omitted)
//! ```
//!
//! Every frame from the server is printed on its own line.  Each line typed
//! at the console is sent as one frame.  Typing `exit` or `close` asks the
//! server to end the session; the client then prints the farewell and quits
//! once the server closes the connection.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use chat_client::{compose, validate_name, ChatConnection, ClientEvent, Outbound};

/// How long to wait for `Goodbye!` and the close after sending an exit word.
const LEAVE_TIMEOUT: Duration = Duration::from_secs(5);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Console client for the chat relay.
#[derive(Debug, Parser)]
#[command(name = "chat-client", about = "Console client for the chat relay", version)]
struct Cli {
    /// Server IP address.
    #[arg(long, default_value = "127.0.0.1", env = "CHAT_HOST")]
    host: String,

    /// Server TCP port.
    #[arg(long, default_value_t = 8000, env = "CHAT_PORT")]
    port: u16,

    /// Display name; prompted for on stdin when omitted.
    #[arg(long, env = "CHAT_NAME")]
    name: Option<String>,
}

impl Cli {
    fn server_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid server address: '{}:{}'", self.host, self.port))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with chat output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let addr = cli.server_addr()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let raw_name = match cli.name {
        Some(name) => name,
        None => {
            println!("Enter your name:");
            lines
                .next_line()
                .await?
                .context("stdin closed before a name was entered")?
        }
    };
    let name = validate_name(&raw_name).context("name rejected")?;

    let (connection, mut events) = ChatConnection::connect(addr, &name).await?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ClientEvent::Frame(text)) => println!("{text}"),
                Some(ClientEvent::Closed) | None => {
                    println!("Disconnected from server.");
                    break;
                }
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed; leaving");
                    connection.send("exit").await.ok();
                    drain_until_closed(&mut events).await;
                    break;
                };
                match compose(&line) {
                    Ok(Outbound::Send(text)) => {
                        if let Err(e) = connection.send(&text).await {
                            warn!("send failed: {e}");
                            break;
                        }
                    }
                    Ok(Outbound::Leave(word)) => {
                        connection.send(&word).await.ok();
                        drain_until_closed(&mut events).await;
                        break;
                    }
                    Ok(Outbound::Skip) => {}
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    connection.close().await;
    Ok(())
}

/// Prints remaining frames (normally just `Goodbye!`) until the server
/// closes the connection or [`LEAVE_TIMEOUT`] passes.
async fn drain_until_closed(events: &mut mpsc::Receiver<ClientEvent>) {
    let drain = async {
        while let Some(ClientEvent::Frame(text)) = events.recv().await {
            println!("{text}");
        }
    };
    if tokio::time::timeout(LEAVE_TIMEOUT, drain).await.is_err() {
        warn!("server did not close the connection within {LEAVE_TIMEOUT:?}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["chat-client"]);
        assert_eq!(cli.server_addr().unwrap().to_string(), "127.0.0.1:8000");
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "chat-client",
            "--host",
            "10.0.0.5",
            "--port",
            "9000",
            "--name",
            "zoe",
        ]);
        assert_eq!(cli.server_addr().unwrap().to_string(), "10.0.0.5:9000");
        assert_eq!(cli.name.as_deref(), Some("zoe"));
    }

    #[test]
    fn test_invalid_host_is_an_error() {
        let cli = Cli {
            host: "not.an.ip".to_string(),
            port: 8000,
            name: None,
        };
        assert!(cli.server_addr().is_err());
    }
}
