//! IPC module for daemon-client communication
//!
//! Clients submit frames, query status, reset the session and subscribe to
//! per-frame reports over a Unix socket.

mod protocol;
mod server;

pub use server::Server;
