//! Background task that owns the write queue and talks to the network.
//!
//! The worker is the only place that probes, drains and fetches, so at most
//! one sync pass is ever in flight per scheduler.

mod sync;

pub(crate) use sync::{Command, SyncWorker, WorkerDeps};
