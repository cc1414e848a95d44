//! Persistence for the local stats cache and the pending write queue.
//!
//! Both stores are keyed by user id and are synchronous: the payloads are
//! small JSON documents written with an atomic rename.
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{RepositoryError, Result};
pub use file::{FileStatsCache, FileWriteQueue};
pub use memory::{InMemoryStatsCache, InMemoryWriteQueue};
pub use traits::{StatsCache, WriteQueueRepository};

/// Map a user id onto a string safe to embed in a file name.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other character
/// becomes `_`. An empty id maps to `guest`.
pub fn storage_key(user_id: &str) -> String {
    if user_id.is_empty() {
        return "guest".to_owned();
    }
    user_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::storage_key;

    #[test]
    fn storage_key_strips_path_characters() {
        assert_eq!(storage_key("user-42"), "user-42");
        assert_eq!(storage_key("../etc/passwd"), "___etc_passwd");
        assert_eq!(storage_key("a@b.com"), "a_b_com");
        assert_eq!(storage_key(""), "guest");
    }
}
