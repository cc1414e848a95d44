//! Unified error type surfaced by the sync API.
//!
//! Network failures never show up here: they are absorbed by the write queue
//! and reported through [`SyncEvent`](super::SyncEvent)s instead.
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync scheduler requires a remote to be configured before initializing")]
    MissingRemote,

    #[error("sync scheduler requires a reachability probe to be configured before initializing")]
    MissingProbe,

    #[error("sync scheduler for {user_id} has been destroyed")]
    Destroyed { user_id: String },

    #[error("sync worker command channel closed")]
    CommandChannelClosed,

    #[error("sync worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("sync worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
