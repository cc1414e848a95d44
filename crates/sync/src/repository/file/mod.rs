//! File-backed repositories.
//!
//! ```text
//! {data_dir}/
//!   ├── stats_{user}.json
//!   ├── queue_{user}.json
//!   └── queue_{user}.json.bad   (unreadable queue kept for inspection)
//! ```
mod cache;
mod queue;

pub use cache::FileStatsCache;
pub use queue::FileWriteQueue;

use std::fs;
use std::path::Path;

use super::{RepositoryError, Result};

/// Write `bytes` next to `path` and rename over it.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;
    fs::rename(&temp_path, path).map_err(RepositoryError::Io)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(RepositoryError::Io(err)),
    }
}
