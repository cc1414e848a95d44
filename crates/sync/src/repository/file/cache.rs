//! File-based StatsCache implementation.

use std::fs;
use std::path::{Path, PathBuf};

use progress_core::StatsRecord;

use super::{remove_if_exists, write_atomic};
use crate::repository::{RepositoryError, Result, StatsCache, storage_key};

/// Stores one `stats_{user}.json` document per user.
///
/// Documents are parsed leniently: a field the parser cannot read is dropped
/// rather than failing the load. A file that is not JSON at all is reported
/// as an error and left in place for inspection.
pub struct FileStatsCache {
    base_dir: PathBuf,
}

impl FileStatsCache {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, user_id: &str) -> PathBuf {
        self.base_dir
            .join(format!("stats_{}.json", storage_key(user_id)))
    }
}

impl StatsCache for FileStatsCache {
    fn load(&self, user_id: &str) -> Result<Option<StatsRecord>> {
        let path = self.record_path(user_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(RepositoryError::Io(err)),
        };

        let record: StatsRecord = serde_json::from_slice(&bytes)?;
        tracing::debug!("Loaded stats for {} from {}", user_id, path.display());

        Ok(Some(record))
    }

    fn save(&self, record: &StatsRecord) -> Result<()> {
        let path = self.record_path(&record.user_id);
        let bytes = serde_json::to_vec_pretty(record)?;
        write_atomic(&path, &bytes)?;

        tracing::debug!("Saved stats for {} to {}", record.user_id, path.display());
        Ok(())
    }

    fn delete(&self, user_id: &str) -> Result<()> {
        if remove_if_exists(&self.record_path(user_id))? {
            tracing::debug!("Deleted cached stats for {}", user_id);
        }
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<String>> {
        let mut users = Vec::new();

        for entry in fs::read_dir(&self.base_dir).map_err(RepositoryError::Io)? {
            let entry = entry.map_err(RepositoryError::Io)?;
            let path = entry.path();

            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(key) = filename
                    .strip_prefix("stats_")
                    .and_then(|s| s.strip_suffix(".json"))
            {
                users.push(key.to_owned());
            }
        }

        users.sort_unstable();
        Ok(users)
    }
}
