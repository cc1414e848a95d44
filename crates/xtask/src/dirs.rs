//! Directories used by the client, honoring the same environment overrides.

use std::path::{Path, PathBuf};

use progress_bootstrap::ClientConfig;

pub use progress_bootstrap::dirs::log_dir;

/// Client log file, `{log_dir}/client.log`.
pub fn log_file() -> PathBuf {
    log_dir().join(progress_bootstrap::dirs::LOG_FILE)
}

/// Cache and queue directory: `--data-dir`, then `STATS_DATA_DIR`, then the
/// platform default.
pub fn data_dir(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ClientConfig::from_env().data_dir())
}
