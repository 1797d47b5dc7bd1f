//! Storage infrastructure: the optional TOML configuration file.
//!
//! The `config` sub-module reads the file from a caller-supplied path and
//! converts it into the runtime [`ServerConfig`](crate::domain::ServerConfig).

pub mod config;
