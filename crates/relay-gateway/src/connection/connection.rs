//! Individual relay connection
//!
//! Holds the transport, the lifecycle state, and the close-once guard shared
//! by a client's two pumps and its registry entry.

use crate::transport::{CloseReason, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use uuid::Uuid;

/// Opaque client identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Generate a new random client ID
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Connection lifecycle state
///
/// Only the hub moves a connection between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Registered and receiving broadcasts
    Connected,
    /// Removed from the registry as a slow consumer; pumps are shutting down
    Evicting,
    /// Removed from the registry; the transport is closed or closing
    Closed,
}

/// A single relay connection
pub struct Connection {
    /// Unique client ID
    id: ClientId,

    /// Underlying transport
    transport: Arc<dyn Transport>,

    /// Lifecycle state, observable by the pumps
    state: watch::Sender<ConnectionState>,

    /// Set by the first close; guards the transport close
    closed: AtomicBool,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new connection in the `Connected` state
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        let (state, _) = watch::channel(ConnectionState::Connected);

        Arc::new(Self {
            id: ClientId::generate(),
            transport,
            state,
            closed: AtomicBool::new(false),
            created_at: Instant::now(),
        })
    }

    /// Get the client ID
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Move to a new state
    ///
    /// `Closed` is terminal. Returns whether the state changed.
    pub(crate) fn transition(&self, next: ConnectionState) -> bool {
        self.state.send_if_modified(|current| {
            if *current == next || *current == ConnectionState::Closed {
                return false;
            }
            *current = next;
            true
        })
    }

    /// Resolve once the hub no longer holds this connection in its registry
    pub async fn deregistered(&self) {
        let mut state = self.state.subscribe();
        // The sender is owned by `self`, so the wait cannot fail while we borrow it.
        let _ = state
            .wait_for(|state| *state != ConnectionState::Connected)
            .await;
    }

    /// Close the transport exactly once
    ///
    /// Returns `true` for the caller that performed the close. Every later or
    /// concurrent call returns `false` without touching the transport.
    pub async fn close(&self, reason: CloseReason) -> bool {
        if !self.claim_close() {
            return false;
        }

        self.close_transport(reason).await;
        true
    }

    /// Win the close-once guard without touching the transport yet
    ///
    /// The caller that gets `true` owns the close and must follow up with
    /// [`Connection::close_transport`].
    pub(crate) fn claim_close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Close the transport on behalf of the caller that claimed the close
    pub(crate) async fn close_transport(&self, reason: CloseReason) {
        self.transport.close(reason).await;

        tracing::debug!(client_id = %self.id, reason = %reason, "Transport closed");
    }

    /// Whether the transport has been closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Get connection age
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("closed", &self.is_closed())
            .field("created_at", &self.created_at)
            .finish()
    }
}
