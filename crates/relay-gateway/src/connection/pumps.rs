//! Read and write pumps
//!
//! Each connection runs both pumps as separate tasks. Whichever pump stops
//! first claims the close, deregisters the client and closes the transport,
//! which stops the other one.

use super::Connection;
use crate::hub::HubHandle;
use crate::transport::{CloseReason, Payload, TransportError};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Forward everything the peer sends to the hub
pub(super) async fn read_pump(connection: Arc<Connection>, hub: HubHandle) {
    let id = connection.id();

    let reason = loop {
        let received = tokio::select! {
            biased;
            () = connection.deregistered() => break CloseReason::SlowConsumer,
            received = connection.transport().receive() => received,
        };

        match received {
            Ok(payload) => {
                tracing::trace!(client_id = %id, bytes = payload.len(), "Message received");

                if hub.broadcast(id, payload).await.is_err() {
                    tracing::debug!(client_id = %id, "Hub stopped, closing connection");
                    break CloseReason::GoingAway;
                }
            }
            Err(TransportError::Closed) => {
                tracing::debug!(client_id = %id, "Peer closed connection");
                break CloseReason::Normal;
            }
            Err(e) => {
                tracing::warn!(client_id = %id, error = %e, "Read failed");
                break CloseReason::ProtocolError;
            }
        }
    };

    release(&connection, &hub, reason).await;
}

/// Deliver queued payloads to the peer
pub(super) async fn write_pump(
    connection: Arc<Connection>,
    mut outbound: mpsc::Receiver<Payload>,
    hub: HubHandle,
) {
    let id = connection.id();

    let reason = loop {
        let next = tokio::select! {
            biased;
            () = connection.deregistered() => break CloseReason::SlowConsumer,
            next = outbound.recv() => next,
        };

        // The hub drops the queue sender only when it leaves the registry.
        let Some(payload) = next else {
            break CloseReason::GoingAway;
        };

        let sent = tokio::select! {
            biased;
            () = connection.deregistered() => break CloseReason::SlowConsumer,
            sent = connection.transport().send(payload) => sent,
        };

        match sent {
            Ok(()) => {}
            Err(TransportError::Closed) => {
                tracing::debug!(client_id = %id, "Transport closed during write");
                break CloseReason::Normal;
            }
            Err(e) => {
                tracing::warn!(client_id = %id, error = %e, "Write failed");
                break CloseReason::ServerError;
            }
        }
    };

    // `outbound` drops after the close flag is set, so the hub never mistakes
    // a departing client for a dead queue.
    release(&connection, &hub, reason).await;
}

/// Deregister the client and close its transport, if this pump won the close
///
/// The hub hears about the departure before the close handshake runs, so a
/// peer that stalls the handshake never holds a registry slot.
async fn release(connection: &Arc<Connection>, hub: &HubHandle, reason: CloseReason) {
    if connection.claim_close() {
        hub.unregister(connection.clone()).await;
        connection.close_transport(reason).await;
    }
}
