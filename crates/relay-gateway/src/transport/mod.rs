//! Transport adapters
//!
//! The hub only sees the [`Transport`] trait: receive a payload, send a
//! payload, close. Framing and handshakes live behind it.

mod close_reason;
mod error;
pub mod memory;
mod payload;
mod websocket;

pub use close_reason::CloseReason;
pub use error::{BoxError, TransportError, UpgradeError};
pub use payload::Payload;
pub use websocket::WebSocketTransport;

use async_trait::async_trait;
use tokio::sync::watch;

/// A persistent bidirectional message connection
///
/// `receive` is only called by the connection's read pump and `send` only by
/// its write pump, so they may run concurrently. Once `close` has been called,
/// pending and future `receive`/`send` calls fail with
/// [`TransportError::Closed`].
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Wait for the next payload from the peer
    async fn receive(&self) -> Result<Payload, TransportError>;

    /// Deliver a payload to the peer
    async fn send(&self, payload: Payload) -> Result<(), TransportError>;

    /// Close the connection. Must be idempotent.
    async fn close(&self, reason: CloseReason);
}

/// Resolve once the shutdown flag is raised
async fn wait_closed(mut shutdown: watch::Receiver<bool>) {
    // The sender lives as long as the transport, so an error means it is gone anyway.
    let _ = shutdown.wait_for(|closed| *closed).await;
}
