//! Platform-specific directories for cached stats and logs.
//!
//! - data: `~/.local/share/progress` (Linux), `~/Library/Application Support/progress`
//!   (macOS), `%APPDATA%\progress` (Windows), `./progress_data` as fallback
//! - logs: the platform cache dir plus `logs`, `/tmp/progress/logs` as fallback

use std::path::PathBuf;

pub const APP_NAME: &str = "progress";

/// Name of the client log file inside [`log_dir`].
pub const LOG_FILE: &str = "client.log";

pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./progress_data"))
}

pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp").join(APP_NAME))
        .join("logs")
}
