//! Transport error types

use thiserror::Error;

/// Boxed error from the underlying transport library
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure on an established connection
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection was closed by either side
    #[error("Transport closed")]
    Closed,

    #[error("Receive failed: {0}")]
    Receive(#[source] BoxError),

    #[error("Send failed: {0}")]
    Send(#[source] BoxError),
}

/// Failure while accepting a connection; the peer is never registered
#[derive(Debug, Error)]
pub enum UpgradeError {
    /// The request was not a valid upgrade request
    #[error("Upgrade rejected: {0}")]
    Rejected(String),

    /// The handshake started but the connection could not be upgraded
    #[error("Handshake failed: {0}")]
    Handshake(#[source] BoxError),
}
