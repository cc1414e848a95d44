//! In-memory WriteQueueRepository implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::repository::{RepositoryError, Result, WriteQueueRepository, storage_key};
use crate::types::SyncQueueEntry;

#[derive(Default)]
pub struct InMemoryWriteQueue {
    queues: RwLock<HashMap<String, Vec<SyncQueueEntry>>>,
}

impl InMemoryWriteQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WriteQueueRepository for InMemoryWriteQueue {
    fn load(&self, user_id: &str) -> Result<Vec<SyncQueueEntry>> {
        let queues = self
            .queues
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(queues.get(&storage_key(user_id)).cloned().unwrap_or_default())
    }

    fn save(&self, user_id: &str, entries: &[SyncQueueEntry]) -> Result<()> {
        let mut queues = self
            .queues
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        if entries.is_empty() {
            queues.remove(&storage_key(user_id));
        } else {
            queues.insert(storage_key(user_id), entries.to_vec());
        }
        Ok(())
    }
}
