//! Hub error types

use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;

/// Errors returned to callers of the hub
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The hub loop is no longer running
    #[error("Hub stopped")]
    Stopped,

    /// Registration refused because the registry is full
    #[error("Connection limit of {limit} reached")]
    CapacityReached { limit: usize },
}

/// Why a payload could not be queued for a client
///
/// Internal to the fan-out loop; always ends in eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("Outbound queue full")]
    QueueFull,

    #[error("Outbound queue closed")]
    QueueClosed,
}

impl<T> From<TrySendError<T>> for DeliveryError {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => Self::QueueFull,
            TrySendError::Closed(_) => Self::QueueClosed,
        }
    }
}
