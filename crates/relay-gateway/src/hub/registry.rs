//! Connection registry
//!
//! The set of live clients. Owned by the hub task; nothing else mutates it.

use super::DeliveryError;
use crate::connection::{ClientId, Connection};
use crate::transport::Payload;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A registry entry: the connection and the sending half of its outbound queue
///
/// The entry holds the only sender, so removing it from the registry closes
/// the queue.
pub struct RegisteredClient {
    connection: Arc<Connection>,
    outbound: mpsc::Sender<Payload>,
}

impl RegisteredClient {
    pub fn new(connection: Arc<Connection>, outbound: mpsc::Sender<Payload>) -> Self {
        Self {
            connection,
            outbound,
        }
    }

    pub fn id(&self) -> ClientId {
        self.connection.id()
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Queue a payload without waiting
    pub(crate) fn try_deliver(&self, payload: Payload) -> Result<(), DeliveryError> {
        self.outbound.try_send(payload).map_err(DeliveryError::from)
    }
}

impl std::fmt::Debug for RegisteredClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredClient")
            .field("id", &self.id())
            .field("queue_free", &self.outbound.capacity())
            .finish()
    }
}

/// Live clients keyed by ID
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: HashMap<ClientId, RegisteredClient>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client. Returns `false` if the ID was already registered.
    pub fn add(&mut self, client: RegisteredClient) -> bool {
        let id = client.id();
        if self.clients.contains_key(&id) {
            return false;
        }
        self.clients.insert(id, client);
        true
    }

    /// Remove a client, handing back its entry
    pub fn remove(&mut self, id: ClientId) -> Option<RegisteredClient> {
        self.clients.remove(&id)
    }

    /// Point-in-time list of registered IDs
    pub fn snapshot(&self) -> Vec<ClientId> {
        self.clients.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredClient> {
        self.clients.values()
    }

    pub fn get(&self, id: ClientId) -> Option<&RegisteredClient> {
        self.clients.get(&id)
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
