//! Local-first stats synchronization.
//!
//! This crate keeps a user's [`UserStatsSnapshot`](progress_core::UserStatsSnapshot)
//! authoritative on the device and reconciles it with the remote stats API in
//! the background. Consumers build a [`SyncScheduler`] per signed-in user (or
//! guest) and interact with it through [`SyncHandle`].
//!
//! Modules are organized by responsibility:
//! - [`scheduler`] hosts the per-user orchestrator and its builder
//! - [`api`] exposes errors, events and status types downstream clients see
//! - [`remote`] talks to the stats API and probes reachability
//! - [`repository`] persists the local cache and the pending write queue
//! - [`workers`] keeps the background sync task internal to the crate
pub mod api;
pub mod remote;
pub mod repository;
pub mod scheduler;
pub mod types;

mod store;
mod workers;

pub use api::{
    Connectivity, Result, SyncError, SyncEvent, SyncHandle, SyncPhase, SyncReport, SyncStatus,
};
pub use remote::{
    HttpProbe, HttpStatsRemote, InMemoryStatsRemote, ManualProbe, Reachability, RemoteCall,
    RemoteError, StatsRemote,
};
pub use repository::{
    FileStatsCache, FileWriteQueue, InMemoryStatsCache, InMemoryWriteQueue, RepositoryError,
    StatsCache, WriteQueueRepository,
};
pub use scheduler::{SyncConfig, SyncScheduler, SyncSchedulerBuilder};
pub use types::{PendingWrite, SessionReport, SyncQueueEntry};
