//! Public API surface of the sync layer.
//!
//! Re-exports the handle, error and event types that downstream clients use.
mod errors;
mod events;
mod handle;

pub use errors::{RepositoryError, Result, SyncError};
pub use events::{Connectivity, SyncEvent, SyncPhase, SyncReport, SyncStatus};
pub use handle::SyncHandle;

pub(crate) use events::publish;
