//! # relay-gateway
//!
//! WebSocket fan-out relay. Every message a peer sends is broadcast to all
//! connected peers by a single hub task; peers that cannot keep up are evicted.

pub mod connection;
pub mod hub;
pub mod server;
pub mod transport;

pub use connection::{Client, ClientId, Connection, ConnectionState};
pub use hub::{Hub, HubConfig, HubError, HubHandle, HubStats};
pub use server::{create_app, create_router, run, serve, RelayState};
pub use transport::{CloseReason, Payload, Transport, TransportError};
