//! Domain layer for the chat server.
//!
//! Plain configuration types with no I/O.  Populating them from files or the
//! command line is the job of the infrastructure layer and `main.rs`.

pub mod config;

pub use config::ServerConfig;
