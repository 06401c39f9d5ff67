//! Relay state
//!
//! Application state shared by the HTTP handlers.

use crate::hub::{Hub, HubConfig, HubHandle};
use relay_common::RelayConfig;
use std::sync::Arc;

/// Relay application state
#[derive(Clone)]
pub struct RelayState {
    /// Handle to the broadcast hub
    hub: HubHandle,
    /// Relay configuration
    config: Arc<RelayConfig>,
}

impl RelayState {
    /// Create state around an already running hub
    pub fn new(hub: HubHandle, config: RelayConfig) -> Self {
        Self {
            hub,
            config: Arc::new(config),
        }
    }

    /// Start a hub for this configuration and build the state around it
    ///
    /// The hub runs until the state and every connection holding a handle
    /// to it are gone.
    pub fn start(config: RelayConfig) -> Self {
        let (hub, _task) = Hub::spawn(HubConfig::from(&config.hub));
        Self::new(hub, config)
    }

    /// Get the hub handle
    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Get the relay configuration
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

impl std::fmt::Debug for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayState")
            .field("hub", &self.hub)
            .field("config", &"RelayConfig")
            .finish()
    }
}
