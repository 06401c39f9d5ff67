//! Hub statistics

use serde::Serialize;

/// Counters maintained by the hub loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    /// Clients currently in the registry
    pub connected: usize,
    /// Successful registrations
    pub registered_total: u64,
    /// Registrations refused at the connection limit
    pub rejected_total: u64,
    /// Clients removed after their connection ended
    pub deregistered_total: u64,
    /// Clients removed because their outbound queue could not take a message
    pub evicted_total: u64,
    /// Messages fanned out
    pub broadcasts_total: u64,
    /// Payloads queued across all clients
    pub deliveries_total: u64,
}
