//! # Application State
//!
//! Everything a subcommand needs, started once in `main`.
//!
//! ```text
//! ClientConfig
//!     │
//!     ├── Database::new(DbConfig::new(config.database_path()))
//!     ├── HttpCatalogApi::from_config(&config)
//!     ├── ManualConnectivity(false)   when --offline
//!     │   ProbeConnectivity           otherwise
//!     │
//!     └── CoordinatorBuilder ... spawn() ──► CoordinatorHandle
//! ```

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use catalog_db::{Database, DbConfig};
use catalog_sync::{
    ClientConfig, ConnectivitySource, CoordinatorBuilder, CoordinatorHandle, HttpCatalogApi,
    ManualConnectivity, ProbeConnectivity, SyncEvent, SyncEventEmitter,
};

/// Where the connectivity signal comes from for this run.
pub enum Connectivity {
    /// `--offline`: pinned to disconnected.
    Offline(ManualConnectivity),
    Probe(ProbeConnectivity),
}

impl Connectivity {
    pub fn source(&self) -> &dyn ConnectivitySource {
        match self {
            Connectivity::Offline(manual) => manual,
            Connectivity::Probe(probe) => probe,
        }
    }

    pub fn is_offline_mode(&self) -> bool {
        matches!(self, Connectivity::Offline(_))
    }
}

/// Logs coordinator events for the terminal.
pub struct LogEmitter;

impl SyncEventEmitter for LogEmitter {
    fn emit(&self, event: &SyncEvent) {
        match event {
            SyncEvent::ConnectivityChanged { connected } => {
                info!(connected, "Connectivity changed");
            }
            SyncEvent::Queued { id, product_name } => {
                info!(%id, product = %product_name, "Queued for later");
            }
            SyncEvent::ProductAdded { product, replayed } => {
                info!(id = %product.id, product = %product.product_name, replayed, "Product added");
            }
            SyncEvent::SubmissionFailed {
                product_name,
                reason,
            } => {
                warn!(product = %product_name, %reason, "Submission failed");
            }
            SyncEvent::ReplayCompleted(report) => {
                info!(
                    confirmed = report.confirmed,
                    failed = report.failed,
                    remaining = report.remaining,
                    "Replay completed"
                );
            }
        }
    }
}

/// Running client: offline store, connectivity and coordinator.
pub struct AppState {
    pub handle: CoordinatorHandle,
    pub connectivity: Connectivity,
    db: Database,
}

impl AppState {
    pub async fn start(config: ClientConfig, offline: bool) -> anyhow::Result<Self> {
        let db_path = config.database_path();
        info!(path = %db_path.display(), "Opening offline store");
        let db = Database::new(DbConfig::new(db_path))
            .await
            .context("Failed to open the offline store")?;

        let api = HttpCatalogApi::from_config(&config)?;

        let connectivity = if offline {
            Connectivity::Offline(ManualConnectivity::new(false))
        } else {
            Connectivity::Probe(ProbeConnectivity::from_config(&config).await?)
        };

        let (handle, _task) = CoordinatorBuilder::new(config.replay.clone())
            .with_queue(db.offline_queue())
            .with_api(Arc::new(api))
            .with_connectivity(connectivity.source())
            .with_emitter(Arc::new(LogEmitter))
            .spawn()?;

        Ok(AppState {
            handle,
            connectivity,
            db,
        })
    }

    pub async fn shutdown(&self) {
        if let Err(e) = self.handle.shutdown().await {
            warn!(error = %e, "Coordinator already stopped");
        }
        if let Connectivity::Probe(probe) = &self.connectivity {
            probe.shutdown().await;
        }
        self.db.close().await;
    }
}
