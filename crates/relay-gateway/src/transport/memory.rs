//! In-memory transport
//!
//! A [`Transport`] backed by bounded channels, paired with a [`MemoryPeer`]
//! that plays the remote side. Used to drive the hub without sockets.
//! Receive and send failures can be injected to exercise error paths.

use super::{wait_closed, CloseReason, Payload, Transport, TransportError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, watch, Mutex, Notify};

/// Relay side of an in-memory connection
pub struct MemoryTransport {
    inbound: Mutex<mpsc::Receiver<Payload>>,
    outbound: mpsc::Sender<Payload>,
    shutdown: watch::Sender<bool>,
    close_calls: AtomicUsize,
    close_reason: OnceLock<CloseReason>,
    receive_fault: Notify,
    send_fault: AtomicBool,
}

/// Remote side of an in-memory connection
///
/// Dropping the peer disconnects it: the relay's next receive and send fail.
pub struct MemoryPeer {
    to_relay: mpsc::Sender<Payload>,
    from_relay: mpsc::Receiver<Payload>,
    shutdown: watch::Receiver<bool>,
}

/// Create a connected transport/peer pair
///
/// `capacity` bounds each direction. A peer that stops reading makes the
/// relay's `send` block once `capacity` payloads are in flight.
pub fn pair(capacity: usize) -> (Arc<MemoryTransport>, MemoryPeer) {
    let capacity = capacity.max(1);
    let (to_relay, inbound) = mpsc::channel(capacity);
    let (outbound, from_relay) = mpsc::channel(capacity);
    let (shutdown, shutdown_rx) = watch::channel(false);

    let transport = Arc::new(MemoryTransport {
        inbound: Mutex::new(inbound),
        outbound,
        shutdown,
        close_calls: AtomicUsize::new(0),
        close_reason: OnceLock::new(),
        receive_fault: Notify::new(),
        send_fault: AtomicBool::new(false),
    });

    let peer = MemoryPeer {
        to_relay,
        from_relay,
        shutdown: shutdown_rx,
    };

    (transport, peer)
}

impl MemoryTransport {
    /// Number of times `close` was called
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Reason passed to the first `close` call
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason.get().copied()
    }

    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Fail the pending or next `receive` with [`TransportError::Receive`]
    pub fn fail_next_receive(&self) {
        self.receive_fault.notify_one();
    }

    /// Fail every later `send` with [`TransportError::Send`]
    pub fn fail_sends(&self) {
        self.send_fault.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn receive(&self) -> Result<Payload, TransportError> {
        let closed = wait_closed(self.shutdown.subscribe());
        tokio::pin!(closed);

        let mut inbound = tokio::select! {
            biased;
            () = &mut closed => return Err(TransportError::Closed),
            inbound = self.inbound.lock() => inbound,
        };

        tokio::select! {
            biased;
            () = &mut closed => Err(TransportError::Closed),
            () = self.receive_fault.notified() => {
                Err(TransportError::Receive("injected receive failure".into()))
            }
            payload = inbound.recv() => payload.ok_or(TransportError::Closed),
        }
    }

    async fn send(&self, payload: Payload) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        if self.send_fault.load(Ordering::SeqCst) {
            return Err(TransportError::Send("injected send failure".into()));
        }

        let closed = wait_closed(self.shutdown.subscribe());

        tokio::select! {
            biased;
            () = closed => Err(TransportError::Closed),
            result = self.outbound.send(payload) => result.map_err(|_| TransportError::Closed),
        }
    }

    async fn close(&self, reason: CloseReason) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.close_reason.set(reason);
        self.shutdown.send_replace(true);
    }
}

impl MemoryPeer {
    /// Send a payload to the relay
    pub async fn send(&self, payload: impl Into<Payload>) -> Result<(), TransportError> {
        if *self.shutdown.borrow() {
            return Err(TransportError::Closed);
        }
        self.to_relay
            .send(payload.into())
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Next payload from the relay, or `None` once the relay closed the
    /// connection and nothing is left to read
    pub async fn recv(&mut self) -> Option<Payload> {
        let closed = wait_closed(self.shutdown.clone());

        tokio::select! {
            biased;
            payload = self.from_relay.recv() => payload,
            () = closed => self.from_relay.try_recv().ok(),
        }
    }

    /// Payload already delivered, without waiting
    pub fn try_recv(&mut self) -> Option<Payload> {
        self.from_relay.try_recv().ok()
    }

    /// Whether the relay closed this connection
    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Wait until the relay closes this connection
    pub async fn closed(&self) {
        wait_closed(self.shutdown.clone()).await;
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("closed", &self.is_closed())
            .field("close_calls", &self.close_calls())
            .finish()
    }
}
