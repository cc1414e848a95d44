//! Repository contracts for the per-user cache and write queue.

use progress_core::StatsRecord;

use super::Result;
use crate::types::SyncQueueEntry;

/// Last known stats record per user.
///
/// The cache is what makes reads instant and offline play possible: it is
/// rewritten after every local mutation and read once on start-up.
pub trait StatsCache: Send + Sync {
    fn load(&self, user_id: &str) -> Result<Option<StatsRecord>>;

    fn save(&self, record: &StatsRecord) -> Result<()>;

    /// Remove the user's record. Missing records are not an error.
    fn delete(&self, user_id: &str) -> Result<()>;

    /// Storage keys of every cached user.
    fn list_users(&self) -> Result<Vec<String>> {
        Ok(vec![])
    }
}

/// Durable FIFO of writes the remote has not acknowledged.
///
/// The queue is small and rewritten whole; `save` with an empty slice clears
/// the user's queue.
pub trait WriteQueueRepository: Send + Sync {
    fn load(&self, user_id: &str) -> Result<Vec<SyncQueueEntry>>;

    fn save(&self, user_id: &str, entries: &[SyncQueueEntry]) -> Result<()>;

    /// Move an unreadable queue out of the way so the next `save` cannot
    /// overwrite it. Stores that never fail to load have nothing to do.
    fn set_aside(&self, _user_id: &str) -> Result<()> {
        Ok(())
    }
}
