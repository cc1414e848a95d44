//! Cloneable façade over one user's synced stats.
//!
//! [`SyncHandle`] serves reads straight from the local snapshot and applies
//! sessions locally before handing the resulting writes to the worker.
//! `read` and `write` never wait on the worker, so a hung request cannot
//! stall them. Methods returning a worker reply do wait for it.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Local, TimeZone, Utc};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::info;

use progress_core::{
    LevelProgress, ProgressReconciler, ReconcileOutcome, SessionResult, UserStatsSnapshot,
    XpCurve,
};

use super::errors::{Result, SyncError};
use super::events::{SyncEvent, SyncReport, SyncStatus, publish};
use crate::scheduler::SyncConfig;
use crate::store::LocalStore;
use crate::types::{PendingWrite, SessionReport};
use crate::workers::Command;

/// Client-facing handle to a running scheduler.
#[derive(Clone)]
pub struct SyncHandle<Tz: TimeZone = Local> {
    user_id: String,
    config: SyncConfig,
    reconciler: Arc<ProgressReconciler<Tz>>,
    store: LocalStore,
    command_tx: mpsc::UnboundedSender<Command>,
    event_tx: broadcast::Sender<SyncEvent>,
    status_rx: watch::Receiver<SyncStatus>,
    destroyed: Arc<AtomicBool>,
    /// Set while a `Refresh` command is queued and not yet handled.
    refresh_requested: Arc<AtomicBool>,
}

impl<Tz: TimeZone> SyncHandle<Tz> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        user_id: String,
        config: SyncConfig,
        reconciler: Arc<ProgressReconciler<Tz>>,
        store: LocalStore,
        command_tx: mpsc::UnboundedSender<Command>,
        event_tx: broadcast::Sender<SyncEvent>,
        status_rx: watch::Receiver<SyncStatus>,
        destroyed: Arc<AtomicBool>,
        refresh_requested: Arc<AtomicBool>,
    ) -> Self {
        Self {
            user_id,
            config,
            reconciler,
            store,
            command_tx,
            event_tx,
            status_rx,
            destroyed,
            refresh_requested,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn curve(&self) -> &XpCurve {
        self.reconciler.curve()
    }

    /// Current snapshot, immediately.
    ///
    /// When the last server fetch is older than the freshness window a
    /// background refresh is requested; the returned value is not delayed by it.
    pub fn read(&self) -> UserStatsSnapshot {
        if !self.is_destroyed()
            && !self.store.is_fresh(self.config.freshness)
            && !self.refresh_requested.swap(true, Ordering::SeqCst)
        {
            let _ = self.command_tx.send(Command::Refresh);
        }
        self.store.snapshot()
    }

    /// In-level progress for the current snapshot.
    pub fn progress(&self) -> LevelProgress {
        self.store.snapshot().progress(self.curve())
    }

    /// Apply a finished session locally and schedule its remote write.
    ///
    /// The returned outcome reflects the persisted local snapshot. Delivery
    /// happens in the background; when offline, or when delivery fails, the
    /// write waits in the queue.
    pub async fn write(&self, session: &SessionResult) -> Result<ReconcileOutcome> {
        self.ensure_alive()?;

        let now = Utc::now();
        let outcome = self.store.update(|current| {
            let outcome = self.reconciler.apply_game_session(current, session, now);
            (outcome.snapshot.clone(), outcome)
        });

        if outcome.leveled_up {
            info!(
                user_id = %self.user_id,
                from = outcome.previous_level,
                to = outcome.new_level,
                "Level up"
            );
            publish(
                &self.event_tx,
                SyncEvent::LevelUp {
                    user_id: self.user_id.clone(),
                    previous_level: outcome.previous_level,
                    new_level: outcome.new_level,
                    rewards: outcome.rewards,
                },
            );
        }

        let mut writes = Vec::with_capacity(2);
        if self.config.report_sessions
            && let Some(results) = outcome.snapshot.last_game_results.clone()
        {
            writes.push(PendingWrite::Session(SessionReport {
                user_id: self.user_id.clone(),
                results,
            }));
        }
        writes.push(PendingWrite::Snapshot(outcome.snapshot.to_record()));

        self.command_tx
            .send(Command::Push {
                writes,
                enqueued_at: now,
            })
            .map_err(|_| SyncError::CommandChannelClosed)?;

        Ok(outcome)
    }

    /// Probe now, drain the queue and refresh, ignoring the probe throttle.
    pub async fn force_sync(&self) -> Result<SyncReport> {
        self.ensure_alive()?;
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::SyncNow { reply: reply_tx })
            .map_err(|_| SyncError::CommandChannelClosed)?;

        reply_rx.await.map_err(SyncError::ReplyChannelClosed)
    }

    /// Number of writes the remote has not acknowledged.
    ///
    /// Answered by the worker after every command sent before it, so a
    /// preceding `write` is always accounted for.
    pub async fn pending_writes(&self) -> Result<usize> {
        self.ensure_alive()?;
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::PendingWrites { reply: reply_tx })
            .map_err(|_| SyncError::CommandChannelClosed)?;

        reply_rx.await.map_err(SyncError::ReplyChannelClosed)
    }

    /// Forget the cached snapshot and every pending write for this user.
    ///
    /// Server-side data is untouched.
    pub async fn wipe_account_data(&self) -> Result<()> {
        self.ensure_alive()?;
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Wipe { reply: reply_tx })
            .map_err(|_| SyncError::CommandChannelClosed)?;

        reply_rx.await.map_err(SyncError::ReplyChannelClosed)?
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    /// Latest published status.
    pub fn status(&self) -> SyncStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn watch_status(&self) -> watch::Receiver<SyncStatus> {
        self.status_rx.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Stop the worker without waiting for it. Results of a request still in
    /// flight are discarded when it completes.
    pub(crate) fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.command_tx.send(Command::Shutdown);
        info!(user_id = %self.user_id, "Sync scheduler destroyed");
    }

    pub(crate) fn request_shutdown(&self) {
        let _ = self.command_tx.send(Command::Shutdown);
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(SyncError::Destroyed {
                user_id: self.user_id.clone(),
            });
        }
        Ok(())
    }
}
