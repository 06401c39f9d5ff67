//! Client actor
//!
//! Registers a connection with the hub and spawns its two pumps.

use super::{pumps, ClientId, Connection, ConnectionState};
use crate::hub::{HubError, HubHandle, RegisteredClient};
use crate::transport::{CloseReason, Transport};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A registered client with running pumps
pub struct Client {
    connection: Arc<Connection>,
    read_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl Client {
    /// Register a transport with the hub and start its pumps
    ///
    /// If the hub refuses the registration the transport is closed and the
    /// client is never registered.
    pub async fn connect(
        hub: &HubHandle,
        transport: Arc<dyn Transport>,
        outbound_capacity: usize,
    ) -> Result<Self, HubError> {
        let connection = Connection::new(transport);
        let (outbound_tx, outbound_rx) = mpsc::channel(outbound_capacity.max(1));

        let registered = RegisteredClient::new(connection.clone(), outbound_tx);
        if let Err(e) = hub.register(registered).await {
            let reason = match e {
                HubError::CapacityReached { .. } => CloseReason::Overloaded,
                HubError::Stopped => CloseReason::GoingAway,
            };
            connection.close(reason).await;
            connection.transition(ConnectionState::Closed);
            return Err(e);
        }

        let read_task = tokio::spawn(pumps::read_pump(connection.clone(), hub.clone()));
        let write_task = tokio::spawn(pumps::write_pump(
            connection.clone(),
            outbound_rx,
            hub.clone(),
        ));

        Ok(Self {
            connection,
            read_task,
            write_task,
        })
    }

    /// Get the client ID
    pub fn id(&self) -> ClientId {
        self.connection.id()
    }

    /// Get the shared connection
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Wait for both pumps to finish
    pub async fn join(self) {
        let id = self.connection.id();
        let (read, write) = tokio::join!(self.read_task, self.write_task);

        for result in [read, write] {
            if let Err(e) = result {
                tracing::error!(client_id = %id, error = %e, "Pump task failed");
            }
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("connection", &self.connection)
            .finish()
    }
}
