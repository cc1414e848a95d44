//! In-memory copy of the user's snapshot, written through to the cache.
//!
//! The foreground (reads and session writes) and the background worker share
//! one [`LocalStore`]. Local writes bump a revision counter; the worker only
//! lands a server merge if no local write happened while it was in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use progress_core::{StatsRecord, UserStatsSnapshot};

use crate::repository::StatsCache;

struct LocalState {
    snapshot: UserStatsSnapshot,
    revision: u64,
    last_fetched: Option<Instant>,
}

#[derive(Clone)]
pub(crate) struct LocalStore {
    state: Arc<Mutex<LocalState>>,
    cache: Arc<dyn StatsCache>,
}

impl LocalStore {
    /// Load the cached snapshot for `user_id`, or start from new-user defaults
    /// and cache them.
    ///
    /// An unreadable cache is logged and treated as empty, but not overwritten
    /// until the next local write.
    pub(crate) fn open(
        user_id: &str,
        cache: Arc<dyn StatsCache>,
        restore: impl FnOnce(StatsRecord) -> UserStatsSnapshot,
    ) -> Self {
        let snapshot = match cache.load(user_id) {
            Ok(Some(record)) if record.user_id == user_id => restore(record),
            Ok(Some(record)) => {
                warn!(
                    "Cached stats belong to {}, not {}; starting fresh",
                    record.user_id, user_id
                );
                UserStatsSnapshot::new_user(user_id)
            }
            Ok(None) => {
                let snapshot = UserStatsSnapshot::new_user(user_id);
                if let Err(err) = cache.save(&snapshot.to_record()) {
                    warn!("Failed to cache new-user stats for {}: {}", user_id, err);
                }
                snapshot
            }
            Err(err) => {
                warn!("Failed to load cached stats for {}: {}", user_id, err);
                UserStatsSnapshot::new_user(user_id)
            }
        };

        Self {
            state: Arc::new(Mutex::new(LocalState {
                snapshot,
                revision: 0,
                last_fetched: None,
            })),
            cache,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LocalState> {
        // snapshots are replaced wholesale, so a poisoned guard still holds a complete one
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, snapshot: &UserStatsSnapshot) {
        if let Err(err) = self.cache.save(&snapshot.to_record()) {
            warn!("Failed to cache stats for {}: {}", snapshot.user_id, err);
        }
    }

    pub(crate) fn snapshot(&self) -> UserStatsSnapshot {
        self.lock().snapshot.clone()
    }

    /// Snapshot together with the revision it was read at.
    pub(crate) fn read(&self) -> (UserStatsSnapshot, u64) {
        let state = self.lock();
        (state.snapshot.clone(), state.revision)
    }

    /// Apply a local mutation and write it through to the cache.
    pub(crate) fn update<R>(
        &self,
        mutate: impl FnOnce(&UserStatsSnapshot) -> (UserStatsSnapshot, R),
    ) -> R {
        let mut state = self.lock();
        let (next, output) = mutate(&state.snapshot);
        state.snapshot = next;
        state.revision += 1;
        self.persist(&state.snapshot);
        output
    }

    /// Land a snapshot computed from a server response, unless a local write
    /// happened after `revision` was read.
    pub(crate) fn replace_if_unchanged(&self, revision: u64, snapshot: UserStatsSnapshot) -> bool {
        let mut state = self.lock();
        if state.revision != revision {
            return false;
        }
        if state.snapshot != snapshot {
            state.snapshot = snapshot;
            self.persist(&state.snapshot);
        }
        true
    }

    pub(crate) fn mark_fetched(&self) {
        self.lock().last_fetched = Some(Instant::now());
    }

    pub(crate) fn is_fresh(&self, window: Duration) -> bool {
        self.lock()
            .last_fetched
            .is_some_and(|at| at.elapsed() < window)
    }

    /// Drop everything known about the user and forget the cached record.
    pub(crate) fn reset(&self) {
        let mut state = self.lock();
        let user_id = state.snapshot.user_id.clone();
        state.snapshot = UserStatsSnapshot::new_user(user_id.clone());
        state.revision += 1;
        state.last_fetched = None;
        if let Err(err) = self.cache.delete(&user_id) {
            warn!("Failed to delete cached stats for {}: {}", user_id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStatsCache;
    use progress_core::XpCurve;

    fn restore(record: StatsRecord) -> UserStatsSnapshot {
        UserStatsSnapshot::from_record(record, None, &XpCurve::default())
    }

    #[test]
    fn opens_from_cache_and_writes_through() {
        let cache = Arc::new(InMemoryStatsCache::with_record(StatsRecord {
            xp: Some(146),
            ..StatsRecord::empty("u1")
        }));
        let store = LocalStore::open("u1", cache.clone(), restore);
        assert_eq!(store.snapshot().level(), 2);

        store.update(|current| {
            let mut next = current.clone();
            next.diamonds = 9;
            (next, ())
        });
        assert_eq!(cache.load("u1").unwrap().unwrap().diamonds, Some(9));
    }

    #[test]
    fn server_merge_loses_to_a_newer_local_write() {
        let store = LocalStore::open("u1", Arc::new(InMemoryStatsCache::new()), restore);
        let (before, revision) = store.read();

        store.update(|current| {
            let mut next = current.clone();
            next.diamonds = 5;
            (next, ())
        });

        let mut stale = before;
        stale.diamonds = 1;
        assert!(!store.replace_if_unchanged(revision, stale));
        assert_eq!(store.snapshot().diamonds, 5);
    }

    #[test]
    fn foreign_cache_entry_is_ignored() {
        let cache = Arc::new(InMemoryStatsCache::new());
        cache
            .save(&StatsRecord {
                xp: Some(900),
                ..StatsRecord::empty("u_1")
            })
            .unwrap();

        // "u.1" and "u_1" share a storage key
        let store = LocalStore::open("u.1", cache, restore);
        assert_eq!(store.snapshot().xp(), 0);
        assert_eq!(store.snapshot().user_id, "u.1");
    }
}
