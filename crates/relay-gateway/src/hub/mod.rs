//! Broadcast hub
//!
//! A single task owns the connection registry and processes every register,
//! unregister and broadcast command in arrival order.

mod error;
mod handle;
mod hub;
mod registry;
mod stats;

pub use error::{DeliveryError, HubError};
pub use handle::HubHandle;
pub use hub::{Hub, HubConfig};
pub use registry::{ConnectionRegistry, RegisteredClient};
pub use stats::HubStats;

use crate::connection::{ClientId, Connection};
use crate::transport::Payload;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Commands processed by the hub loop
pub(crate) enum HubCommand {
    Register {
        client: RegisteredClient,
        ack: oneshot::Sender<Result<(), HubError>>,
    },
    Unregister {
        connection: Arc<Connection>,
    },
    Broadcast {
        origin: ClientId,
        payload: Payload,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<ClientId>>,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
}
