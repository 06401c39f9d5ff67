//! WebSocket handler
//!
//! Accepts upgrade requests and hands each upgraded socket to a client actor.

use crate::connection::Client;
use crate::server::RelayState;
use crate::transport::{UpgradeError, WebSocketTransport};
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocket},
        State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use relay_common::TransportSettings;
use std::sync::Arc;

/// Socket buffer and message limits applied to every upgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketLimits {
    pub read_buffer_size: usize,
    pub write_buffer_size: usize,
    /// Library default when unset
    pub max_message_size: Option<usize>,
}

impl SocketLimits {
    /// Configure an upgrade with these limits
    pub fn apply(self, upgrade: WebSocketUpgrade) -> WebSocketUpgrade {
        let upgrade = upgrade
            .read_buffer_size(self.read_buffer_size)
            .write_buffer_size(self.write_buffer_size);

        match self.max_message_size {
            Some(limit) => upgrade.max_message_size(limit),
            None => upgrade,
        }
    }
}

impl From<&TransportSettings> for SocketLimits {
    fn from(settings: &TransportSettings) -> Self {
        Self {
            read_buffer_size: settings.read_buffer_size,
            write_buffer_size: settings.write_buffer_size,
            max_message_size: settings.max_message_size,
        }
    }
}

/// Relay upgrade handler
pub async fn relay_handler(
    State(state): State<RelayState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            let error = UpgradeError::Rejected(rejection.body_text());
            tracing::debug!(error = %error, "Not an upgrade request");
            return rejection.into_response();
        }
    };

    SocketLimits::from(&state.config().transport)
        .apply(upgrade)
        .on_failed_upgrade(|e| {
            let error = UpgradeError::Handshake(Box::new(e));
            tracing::warn!(error = %error, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: RelayState, socket: WebSocket) {
    let transport = Arc::new(WebSocketTransport::new(socket));
    let capacity = state.config().hub.outbound_capacity;

    let client = match Client::connect(state.hub(), transport, capacity).await {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "Connection rejected");
            return;
        }
    };

    let id = client.id();
    let connection = client.connection().clone();
    tracing::info!(client_id = %id, "Client connected");

    client.join().await;

    tracing::info!(
        client_id = %id,
        state = ?connection.state(),
        duration_ms = connection.age().as_millis(),
        "Client disconnected"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_follow_transport_settings() {
        let settings = TransportSettings {
            read_buffer_size: 4096,
            write_buffer_size: 2048,
            max_message_size: Some(65_536),
        };

        assert_eq!(
            SocketLimits::from(&settings),
            SocketLimits {
                read_buffer_size: 4096,
                write_buffer_size: 2048,
                max_message_size: Some(65_536),
            }
        );
    }

    #[test]
    fn test_message_size_defaults_to_library_limit() {
        let settings = TransportSettings {
            read_buffer_size: 1024,
            write_buffer_size: 1024,
            max_message_size: None,
        };

        assert_eq!(SocketLimits::from(&settings).max_message_size, None);
    }
}
