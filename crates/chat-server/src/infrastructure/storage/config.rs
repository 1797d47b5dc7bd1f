//! TOML-based configuration file for the chat server.
//!
//! The file is optional.  When present it holds a single `[server]` table:
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0"
//! port = 9000
//! handshake_timeout_secs = 30
//! write_timeout_secs = 5
//! accept_poll_ms = 200
//! log_level = "debug"
//! ```
//!
//! Every field is optional.  Fields annotated with
//! `#[serde(default = "some_fn")]` take the return value of `some_fn()` when
//! absent, and a missing file yields [`FileConfig::default()`].

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::ServerConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `bind_address` is not an IP address.
    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
}

/// The `[server]` table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerSection {
    /// IP address to listen on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,

    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,

    #[serde(default = "default_accept_poll_ms")]
    pub accept_poll_ms: u64,

    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default value functions (required by serde) ───────────────────────────────

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_handshake_timeout_secs() -> u64 {
    30
}
fn default_write_timeout_secs() -> u64 {
    5
}
fn default_accept_poll_ms() -> u64 {
    200
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            handshake_timeout_secs: default_handshake_timeout_secs(),
            write_timeout_secs: default_write_timeout_secs(),
            accept_poll_ms: default_accept_poll_ms(),
            log_level: default_log_level(),
        }
    }
}

impl FileConfig {
    /// Converts the file representation into the runtime [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] if `bind_address` does not
    /// parse as an IP address.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let s = &self.server;
        let ip: IpAddr = s
            .bind_address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(s.bind_address.clone()))?;
        Ok(ServerConfig {
            bind_addr: SocketAddr::new(ip, s.port),
            handshake_timeout: Duration::from_secs(s.handshake_timeout_secs),
            write_timeout: Duration::from_secs(s.write_timeout_secs),
            accept_poll_interval: Duration::from_millis(s.accept_poll_ms),
        })
    }
}

/// Loads the config file at `path`, returning [`FileConfig::default()`] if
/// the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: FileConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_default_file_config_matches_server_config_default() {
        let cfg = FileConfig::default().to_server_config().unwrap();
        assert_eq!(cfg, ServerConfig::default());
    }

    #[test]
    fn test_default_log_level_is_info() {
        assert_eq!(FileConfig::default().server.log_level, "info");
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: FileConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, FileConfig::default());
    }

    #[test]
    fn test_deserialize_partial_server_table_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[server]
port = 9100
write_timeout_secs = 1
"#;

        // Act
        let cfg: FileConfig = toml::from_str(toml_str).expect("deserialize partial");
        let runtime = cfg.to_server_config().unwrap();

        // Assert
        assert_eq!(runtime.bind_addr.to_string(), "127.0.0.1:9100");
        assert_eq!(runtime.write_timeout, Duration::from_secs(1));
        assert_eq!(runtime.handshake_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        let result: Result<FileConfig, _> = toml::from_str("[server\nport = ");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_bind_address_is_rejected() {
        let mut cfg = FileConfig::default();
        cfg.server.bind_address = "not-an-ip".to_string();
        assert!(matches!(
            cfg.to_server_config(),
            Err(ConfigError::InvalidAddress(addr)) if addr == "not-an-ip"
        ));
    }

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/chat.toml");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg, FileConfig::default());
    }

    #[test]
    fn test_load_config_reads_file_from_temp_dir() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("chat_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chat.toml");
        std::fs::write(
            &path,
            "[server]\nbind_address = \"0.0.0.0\"\nlog_level = \"debug\"\n",
        )
        .unwrap();

        // Act
        let cfg = load_config(&path).unwrap();

        // Assert
        assert_eq!(cfg.server.bind_address, "0.0.0.0");
        assert_eq!(cfg.server.log_level, "debug");
        assert_eq!(cfg.server.port, 8000);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_reports_parse_error() {
        let dir = std::env::temp_dir().join(format!("chat_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chat.toml");
        std::fs::write(&path, "[server]\nport = \"eighty\"\n").unwrap();

        let result = load_config(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }
}
