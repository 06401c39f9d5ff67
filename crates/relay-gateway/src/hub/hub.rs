//! Hub loop
//!
//! Receives commands from every connection and fans broadcasts out to the
//! registry. A client whose outbound queue cannot take a message is evicted on
//! the spot; the loop never waits on a single peer.

use super::{
    ConnectionRegistry, DeliveryError, HubCommand, HubError, HubHandle, HubStats,
    RegisteredClient,
};
use crate::connection::{ClientId, Connection, ConnectionState};
use crate::transport::Payload;
use relay_common::HubSettings;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Configuration for the hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Capacity of the inbound command channel
    pub inbound_capacity: usize,
    /// Maximum number of registered clients
    pub max_connections: usize,
    /// Whether the sender of a broadcast receives it too
    pub echo_to_sender: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::from(&HubSettings::default())
    }
}

impl From<&HubSettings> for HubConfig {
    fn from(settings: &HubSettings) -> Self {
        Self {
            inbound_capacity: settings.inbound_capacity,
            max_connections: settings.max_connections,
            echo_to_sender: settings.echo_to_sender,
        }
    }
}

/// The broadcast hub
pub struct Hub {
    /// Live clients, owned exclusively by this hub
    registry: ConnectionRegistry,
    /// Inbound commands from connections and the server
    commands: mpsc::Receiver<HubCommand>,
    config: HubConfig,
    stats: HubStats,
}

impl Hub {
    /// Create a hub and the handle used to reach it
    pub fn new(config: HubConfig) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(config.inbound_capacity.max(1));

        let hub = Self {
            registry: ConnectionRegistry::new(),
            commands: rx,
            config,
            stats: HubStats::default(),
        };

        (hub, HubHandle::new(tx))
    }

    /// Create a hub and run it on a background task
    pub fn spawn(config: HubConfig) -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(config);
        let task = tokio::spawn(hub.run());
        (handle, task)
    }

    /// Process commands until every handle has been dropped
    pub async fn run(mut self) {
        tracing::info!(
            max_connections = self.config.max_connections,
            echo_to_sender = self.config.echo_to_sender,
            "Hub started"
        );

        while let Some(command) = self.commands.recv().await {
            self.handle(command);
        }

        tracing::info!(
            remaining = self.registry.len(),
            "Hub stopped"
        );
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register { client, ack } => {
                let result = self.register(client);
                // The connection task may have gone away while waiting.
                let _ = ack.send(result);
            }
            HubCommand::Unregister { connection } => self.unregister(&connection),
            HubCommand::Broadcast { origin, payload } => self.broadcast(origin, payload),
            HubCommand::Snapshot { reply } => {
                let _ = reply.send(self.registry.snapshot());
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    fn register(&mut self, client: RegisteredClient) -> Result<(), HubError> {
        let id = client.id();

        if self.registry.len() >= self.config.max_connections {
            self.stats.rejected_total += 1;
            tracing::warn!(
                client_id = %id,
                limit = self.config.max_connections,
                "Connection limit reached, rejecting client"
            );
            return Err(HubError::CapacityReached {
                limit: self.config.max_connections,
            });
        }

        self.registry.add(client);
        self.stats.registered_total += 1;

        tracing::debug!(client_id = %id, connected = self.registry.len(), "Client registered");

        Ok(())
    }

    fn unregister(&mut self, connection: &Arc<Connection>) {
        let id = connection.id();

        // Already gone if the hub evicted it first.
        if let Some(client) = self.registry.remove(id) {
            self.stats.deregistered_total += 1;
            drop(client);
            tracing::debug!(client_id = %id, connected = self.registry.len(), "Client deregistered");
        }

        connection.transition(ConnectionState::Closed);
    }

    fn broadcast(&mut self, origin: ClientId, payload: Payload) {
        if !self.registry.contains(origin) {
            tracing::debug!(client_id = %origin, "Dropping message from unregistered client");
            return;
        }

        let mut delivered = 0u64;
        let mut failed = Vec::new();

        for client in self.registry.iter() {
            if !self.config.echo_to_sender && client.id() == origin {
                continue;
            }

            // Already leaving; its Unregister is queued behind this broadcast.
            if client.connection().is_closed() {
                continue;
            }

            match client.try_deliver(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(DeliveryError::QueueClosed) if client.connection().is_closed() => {}
                Err(cause) => failed.push((client.id(), cause)),
            }
        }

        self.stats.broadcasts_total += 1;
        self.stats.deliveries_total += delivered;

        for (id, cause) in failed {
            self.evict(id, cause);
        }

        tracing::trace!(
            client_id = %origin,
            bytes = payload.len(),
            delivered = delivered,
            "Message broadcast"
        );
    }

    /// Remove a client that could not take a message
    ///
    /// The state change happens before the queue sender is dropped so the
    /// write pump sees the eviction rather than a bare closed queue.
    fn evict(&mut self, id: ClientId, cause: DeliveryError) {
        let Some(client) = self.registry.remove(id) else {
            return;
        };

        client.connection().transition(ConnectionState::Evicting);
        drop(client);
        self.stats.evicted_total += 1;

        match cause {
            DeliveryError::QueueFull => {
                tracing::warn!(client_id = %id, "Evicting slow consumer");
            }
            DeliveryError::QueueClosed => {
                tracing::debug!(client_id = %id, "Evicting client with closed queue");
            }
        }
    }

    fn stats(&self) -> HubStats {
        HubStats {
            connected: self.registry.len(),
            ..self.stats
        }
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("registry", &self.registry.len())
            .field("config", &self.config)
            .finish()
    }
}
