//! Connection management
//!
//! One [`Connection`] per peer, driven by a read pump and a write pump.

mod client;
mod connection;
mod pumps;

pub use client::Client;
pub use connection::{ClientId, Connection, ConnectionState};
