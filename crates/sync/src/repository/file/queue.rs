//! File-based WriteQueueRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use super::{remove_if_exists, write_atomic};
use crate::repository::{RepositoryError, Result, WriteQueueRepository, storage_key};
use crate::types::SyncQueueEntry;

/// Stores each user's pending writes as a JSON array in `queue_{user}.json`.
pub struct FileWriteQueue {
    base_dir: PathBuf,
}

impl FileWriteQueue {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    fn queue_path(&self, user_id: &str) -> PathBuf {
        self.base_dir
            .join(format!("queue_{}.json", storage_key(user_id)))
    }
}

impl WriteQueueRepository for FileWriteQueue {
    fn load(&self, user_id: &str) -> Result<Vec<SyncQueueEntry>> {
        let path = self.queue_path(user_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(RepositoryError::Io(err)),
        };

        let entries: Vec<SyncQueueEntry> = serde_json::from_slice(&bytes)?;
        tracing::debug!(
            "Loaded {} pending writes for {} from {}",
            entries.len(),
            user_id,
            path.display()
        );
        Ok(entries)
    }

    fn save(&self, user_id: &str, entries: &[SyncQueueEntry]) -> Result<()> {
        let path = self.queue_path(user_id);

        if entries.is_empty() {
            remove_if_exists(&path)?;
            tracing::debug!("Cleared write queue for {}", user_id);
            return Ok(());
        }

        let bytes = serde_json::to_vec_pretty(entries)?;
        write_atomic(&path, &bytes)?;

        tracing::debug!(
            "Saved {} pending writes for {} to {}",
            entries.len(),
            user_id,
            path.display()
        );
        Ok(())
    }

    fn set_aside(&self, user_id: &str) -> Result<()> {
        let path = self.queue_path(user_id);
        let bad_path = path.with_extension("json.bad");

        match fs::rename(&path, &bad_path) {
            Ok(()) => {
                tracing::warn!("Moved unreadable write queue to {}", bad_path.display());
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(RepositoryError::Io(err)),
        }
    }
}
