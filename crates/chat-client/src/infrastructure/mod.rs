//! Infrastructure layer for the client: the TCP connection to the server.

pub mod network;
