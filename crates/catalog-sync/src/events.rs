//! # Coordinator Events
//!
//! Notifications the coordinator pushes to whoever renders state (the CLI
//! logs them; a UI would refresh its list).
//!
//! ```text
//! ConnectivityChanged ─► "online" / "offline" badge
//! Queued              ─► pending counter + 1
//! ProductAdded        ─► list refresh
//! SubmissionFailed    ─► error toast
//! ReplayCompleted     ─► pending counter refresh
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use catalog_core::Product;

/// Summary of one replay pass over the offline queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    /// Entries submitted in this pass.
    pub attempted: usize,
    /// Entries the server confirmed (removed from the queue).
    pub confirmed: usize,
    /// Entries that failed and stay queued.
    pub failed: usize,
    /// Queue length after the pass.
    pub remaining: usize,
    pub finished_at: DateTime<Utc>,
}

impl ReplayReport {
    /// Report for a pass that found nothing to send.
    pub fn empty() -> Self {
        ReplayReport {
            attempted: 0,
            confirmed: 0,
            failed: 0,
            remaining: 0,
            finished_at: Utc::now(),
        }
    }
}

/// Something observable happened inside the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    ConnectivityChanged { connected: bool },

    /// A creation request was stored in the offline queue.
    Queued { id: String, product_name: String },

    /// A product entered the catalog after server confirmation.
    ProductAdded { product: Product, replayed: bool },

    /// An online creation request failed and was not queued.
    SubmissionFailed { product_name: String, reason: String },

    ReplayCompleted(ReplayReport),
}

/// Trait for receiving coordinator events.
///
/// Called from the coordinator task; implementations must not block.
pub trait SyncEventEmitter: Send + Sync {
    fn emit(&self, event: &SyncEvent);
}

/// No-op event emitter.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit(&self, _event: &SyncEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = SyncEvent::ConnectivityChanged { connected: true };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "connectivity_changed");
        assert_eq!(value["connected"], true);
    }

    #[test]
    fn test_empty_report() {
        let report = ReplayReport::empty();
        assert_eq!(report.attempted, 0);
        assert_eq!(report.remaining, 0);
    }
}
