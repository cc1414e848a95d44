//! In-process stand-ins for the backend, used by tests and offline demos.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use progress_core::StatsRecord;

use super::{Reachability, RemoteError, StatsRemote};
use crate::api::Connectivity;
use crate::types::SessionReport;

/// A request as observed by [`InMemoryStatsRemote`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteCall {
    Fetch { user_id: String },
    PushStats(StatsRecord),
    FinishSession(SessionReport),
}

#[derive(Default)]
struct RemoteState {
    records: HashMap<String, StatsRecord>,
    sessions: Vec<SessionReport>,
    calls: Vec<RemoteCall>,
    unavailable: bool,
    scripted_failures: VecDeque<RemoteError>,
}

/// Backend kept in a map, with the same upsert semantics as the real one.
///
/// Every request is recorded, including the ones that fail, so tests can
/// assert on exactly what reached the wire.
#[derive(Clone, Default)]
pub struct InMemoryStatsRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl InMemoryStatsRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` as if an earlier device had pushed it.
    pub fn seed(&self, record: StatsRecord) {
        let mut state = self.lock();
        state.records.insert(record.user_id.clone(), record);
    }

    pub fn record(&self, user_id: &str) -> Option<StatsRecord> {
        self.lock().records.get(user_id).cloned()
    }

    pub fn sessions(&self) -> Vec<SessionReport> {
        self.lock().sessions.clone()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Fail every request with [`RemoteError::Unavailable`] until re-enabled.
    pub fn set_available(&self, available: bool) {
        self.lock().unavailable = !available;
    }

    /// Fail the next request with `error`, once.
    pub fn fail_next(&self, error: RemoteError) {
        self.lock().scripted_failures.push_back(error);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RemoteState> {
        // the state is only ever mutated in whole steps
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn admit(state: &mut RemoteState) -> Result<(), RemoteError> {
        if let Some(err) = state.scripted_failures.pop_front() {
            return Err(err);
        }
        if state.unavailable {
            return Err(RemoteError::Unavailable);
        }
        Ok(())
    }
}

/// Overlay the fields `patch` carries onto `stored`.
fn upsert(stored: Option<StatsRecord>, patch: &StatsRecord) -> StatsRecord {
    let base = stored.unwrap_or_else(|| StatsRecord::empty(patch.user_id.clone()));
    let patch = patch.clone();
    StatsRecord {
        user_id: base.user_id,
        xp: patch.xp.or(base.xp),
        level: patch.level.or(base.level),
        diamonds: patch.diamonds.or(base.diamonds),
        hearts: patch.hearts.or(base.hearts),
        max_hearts: patch.max_hearts.or(base.max_hearts),
        streak: patch.streak.or(base.streak),
        max_streak: patch.max_streak.or(base.max_streak),
        accuracy: patch.accuracy.or(base.accuracy),
        total_sessions: patch.total_sessions.or(base.total_sessions),
        total_correct_answers: patch.total_correct_answers.or(base.total_correct_answers),
        total_wrong_answers: patch.total_wrong_answers.or(base.total_wrong_answers),
        total_time_spent: patch.total_time_spent.or(base.total_time_spent),
        last_played: patch.last_played.or(base.last_played),
        last_game_results: patch.last_game_results.or(base.last_game_results),
    }
}

#[async_trait]
impl StatsRemote for InMemoryStatsRemote {
    async fn fetch_stats(&self, user_id: &str) -> Result<StatsRecord, RemoteError> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::Fetch {
            user_id: user_id.to_owned(),
        });
        Self::admit(&mut state)?;

        state
            .records
            .get(user_id)
            .cloned()
            .ok_or_else(|| RemoteError::Status {
                status: 404,
                body: format!("no stats for {user_id}"),
            })
    }

    async fn push_stats(&self, record: &StatsRecord) -> Result<StatsRecord, RemoteError> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::PushStats(record.clone()));
        Self::admit(&mut state)?;

        let stored = upsert(state.records.remove(&record.user_id), record);
        state.records.insert(stored.user_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn finish_session(&self, report: &SessionReport) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::FinishSession(report.clone()));
        Self::admit(&mut state)?;

        state.sessions.push(report.clone());
        Ok(())
    }
}

/// Reachability answer controlled by the caller.
#[derive(Clone)]
pub struct ManualProbe {
    online: Arc<AtomicBool>,
    probes: Arc<AtomicUsize>,
}

impl ManualProbe {
    pub fn new(connectivity: Connectivity) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(connectivity == Connectivity::Online)),
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn online() -> Self {
        Self::new(Connectivity::Online)
    }

    pub fn offline() -> Self {
        Self::new(Connectivity::Offline)
    }

    pub fn set(&self, connectivity: Connectivity) {
        self.online
            .store(connectivity == Connectivity::Online, Ordering::SeqCst);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reachability for ManualProbe {
    async fn probe(&self) -> Connectivity {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.online.load(Ordering::SeqCst) {
            Connectivity::Online
        } else {
            Connectivity::Offline
        }
    }
}
