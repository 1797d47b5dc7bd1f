//! Application layer for the client.
//!
//! - **`compose`** – Turns a typed console line into what should happen next:
//!   send it, send it and leave, skip it, or refuse it locally.  Length
//!   limits are enforced here so oversized text never reaches the framing
//!   layer.

pub mod compose;
