//! # catalog-sync: Offline Submission Queue
//!
//! This crate connects the catalog client to the remote catalog API and keeps
//! product creation working while the device is offline.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Submission Coordinator Layout                       │
//! │                                                                         │
//! │   Front end (CLI / UI)                                                 │
//! │        │  CoordinatorHandle (mpsc + oneshot)                           │
//! │        ▼                                                                │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │             SubmissionCoordinator (single tokio task)            │  │
//! │  │                                                                  │  │
//! │  │   CatalogStore (in memory)     OfflineQueueRepository (SQLite)   │  │
//! │  └──────┬──────────────────────────────┬──────────────────▲────────┘  │
//! │         │ spawn                        │ watch<bool>      │ completion │
//! │         ▼                              │                  │            │
//! │  ┌────────────────┐          ┌─────────┴────────┐         │            │
//! │  │  CatalogApi    │──────────┤ Connectivity     │         │            │
//! │  │  (reqwest)     │          │ Source           │         │            │
//! │  │  GET / POST    │──────────┴──────────────────┴─────────┘            │
//! │  └────────────────┘                                                    │
//! │                                                                         │
//! │  EVENTS (SyncEventEmitter):                                            │
//! │  • ConnectivityChanged • Queued • ProductAdded                         │
//! │  • SubmissionFailed    • ReplayCompleted                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`api`] - Remote catalog API trait and reqwest client
//! - [`catalog`] - In-memory catalog store
//! - [`config`] - Client configuration (TOML + environment)
//! - [`connectivity`] - Connectivity sources (manual, TCP probe)
//! - [`coordinator`] - The submission coordinator actor and its handle
//! - [`error`] - Sync error types
//! - [`events`] - Events emitted by the coordinator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_sync::{ClientConfig, CoordinatorBuilder, HttpCatalogApi, ProbeConnectivity};
//!
//! let config = ClientConfig::load_or_default(None);
//! let probe = ProbeConnectivity::from_config(&config)?;
//!
//! let (handle, _task) = CoordinatorBuilder::new(config.replay.clone())
//!     .with_queue(db.offline_queue())
//!     .with_api(Arc::new(HttpCatalogApi::from_config(&config)?))
//!     .with_connectivity(&probe)
//!     .spawn()?;
//!
//! let outcome = handle.submit(NewProduct::new("Pen", "Stationery", 10.0, 5.0), None).await?;
//! println!("{}", outcome);
//! ```

pub mod api;
pub mod catalog;
pub mod config;
pub mod connectivity;
pub mod coordinator;
pub mod error;
pub mod events;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{CatalogApi, HttpCatalogApi};
pub use catalog::CatalogStore;
pub use config::ClientConfig;
pub use connectivity::{ConnectivitySource, ManualConnectivity, ProbeConnectivity};
pub use coordinator::{CoordinatorBuilder, CoordinatorHandle, CoordinatorStatus};
pub use error::{SyncError, SyncResult};
pub use events::{NoOpEmitter, ReplayReport, SyncEvent, SyncEventEmitter};
