//! Hub handle
//!
//! Cloneable front end that turns method calls into hub commands.

use super::{HubCommand, HubError, HubStats, RegisteredClient};
use crate::connection::{ClientId, Connection};
use crate::transport::Payload;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Handle for sending commands to a running hub
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub(crate) fn new(commands: mpsc::Sender<HubCommand>) -> Self {
        Self { commands }
    }

    async fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| HubError::Stopped)
    }

    /// Add a client to the registry
    pub async fn register(&self, client: RegisteredClient) -> Result<(), HubError> {
        let (ack, response) = oneshot::channel();
        self.send(HubCommand::Register { client, ack }).await?;
        response.await.map_err(|_| HubError::Stopped)?
    }

    /// Remove a client whose transport has been closed
    ///
    /// A stopped hub has nothing left to deregister from, so this never fails.
    pub async fn unregister(&self, connection: Arc<Connection>) {
        let id = connection.id();
        if self.send(HubCommand::Unregister { connection }).await.is_err() {
            tracing::trace!(client_id = %id, "Hub stopped before deregistration");
        }
    }

    /// Fan a payload out to every registered client
    pub async fn broadcast(&self, origin: ClientId, payload: Payload) -> Result<(), HubError> {
        self.send(HubCommand::Broadcast { origin, payload }).await
    }

    /// IDs of all registered clients
    pub async fn snapshot(&self) -> Result<Vec<ClientId>, HubError> {
        let (reply, response) = oneshot::channel();
        self.send(HubCommand::Snapshot { reply }).await?;
        response.await.map_err(|_| HubError::Stopped)
    }

    /// Current hub counters
    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (reply, response) = oneshot::channel();
        self.send(HubCommand::Stats { reply }).await?;
        response.await.map_err(|_| HubError::Stopped)
    }

    /// Number of registered clients
    pub async fn client_count(&self) -> Result<usize, HubError> {
        Ok(self.stats().await?.connected)
    }

    /// Whether the hub loop has exited
    pub fn is_stopped(&self) -> bool {
        self.commands.is_closed()
    }
}

impl std::fmt::Debug for HubHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubHandle")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
