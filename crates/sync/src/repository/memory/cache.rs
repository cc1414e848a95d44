//! In-memory StatsCache implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use progress_core::StatsRecord;

use crate::repository::{RepositoryError, Result, StatsCache, storage_key};

/// Keeps records in a map keyed the same way the file cache names its files.
#[derive(Default)]
pub struct InMemoryStatsCache {
    records: RwLock<HashMap<String, StatsRecord>>,
}

impl InMemoryStatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `record` already cached.
    pub fn with_record(record: StatsRecord) -> Self {
        let mut records = HashMap::new();
        records.insert(storage_key(&record.user_id), record);
        Self {
            records: RwLock::new(records),
        }
    }
}

impl StatsCache for InMemoryStatsCache {
    fn load(&self, user_id: &str) -> Result<Option<StatsRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(records.get(&storage_key(user_id)).cloned())
    }

    fn save(&self, record: &StatsRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        records.insert(storage_key(&record.user_id), record.clone());
        Ok(())
    }

    fn delete(&self, user_id: &str) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        records.remove(&storage_key(user_id));
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<String>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut users: Vec<String> = records.keys().cloned().collect();
        users.sort_unstable();
        Ok(users)
    }
}
