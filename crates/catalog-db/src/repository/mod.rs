//! # Repository Module
//!
//! Database repository implementations for the catalog client.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SubmissionCoordinator                                                 │
//! │       │                                                                 │
//! │       │  db.offline_queue().append(&pending)                           │
//! │       ▼                                                                 │
//! │  OfflineQueueRepository                                                │
//! │  ├── append(&self, entry)                                              │
//! │  ├── read_all(&self)                                                   │
//! │  ├── remove(&self, ids)                                                │
//! │  └── clear(&self)                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: offline_store (key, value, updated_at)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`offline::OfflineQueueRepository`] - Pending product submissions

pub mod offline;
