//! Per-user sync orchestrator.
//!
//! The scheduler owns the background worker, wires up the command, event and
//! status channels, and exposes a builder-based API for clients.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use chrono::{Local, TimeZone};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::warn;

use progress_core::{
    ProgressReconciler, ReconcileOutcome, SessionResult, UserStatsSnapshot,
};

use crate::api::{Result, SyncError, SyncEvent, SyncHandle, SyncReport, SyncStatus};
use crate::remote::{Reachability, StatsRemote};
use crate::repository::{InMemoryStatsCache, InMemoryWriteQueue, StatsCache, WriteQueueRepository};
use crate::store::LocalStore;
use crate::workers::{SyncWorker, WorkerDeps};

/// Timing and buffering knobs shared by the scheduler and its worker.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Period of the background sync pass.
    pub sync_interval: Duration,
    /// Minimum spacing between reachability probes. `force_sync` ignores it.
    pub probe_interval: Duration,
    /// How long a fetched snapshot counts as fresh for reads.
    pub freshness: Duration,
    /// Also report each session to `POST /progress/finish`.
    pub report_sessions: bool,
    pub event_buffer_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(30),
            probe_interval: Duration::from_secs(60),
            freshness: Duration::from_secs(30),
            report_sessions: false,
            event_buffer_size: 64,
        }
    }
}

/// Running sync scheduler for one user.
///
/// Design: the scheduler owns the worker task. [`SyncHandle`] is the
/// cloneable façade handed to screens and services.
pub struct SyncScheduler<Tz: TimeZone = Local> {
    handle: SyncHandle<Tz>,
    worker_handle: JoinHandle<()>,
}

impl SyncScheduler<Local> {
    pub fn builder(user_id: impl Into<String>) -> SyncSchedulerBuilder<Local> {
        SyncSchedulerBuilder::new(user_id.into())
    }
}

impl<Tz> SyncScheduler<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
{
    pub fn handle(&self) -> SyncHandle<Tz> {
        self.handle.clone()
    }

    pub fn user_id(&self) -> &str {
        self.handle.user_id()
    }

    pub fn read(&self) -> UserStatsSnapshot {
        self.handle.read()
    }

    pub async fn write(&self, session: &SessionResult) -> Result<ReconcileOutcome> {
        self.handle.write(session).await
    }

    pub async fn force_sync(&self) -> Result<SyncReport> {
        self.handle.force_sync().await
    }

    pub async fn pending_writes(&self) -> Result<usize> {
        self.handle.pending_writes().await
    }

    pub async fn wipe_account_data(&self) -> Result<()> {
        self.handle.wipe_account_data().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.handle.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        self.handle.status()
    }

    /// Tear down without waiting: the worker exits at its next step and any
    /// response still in flight is ignored. Handles start returning
    /// [`SyncError::Destroyed`].
    pub fn destroy(self) {
        self.handle.destroy();
    }

    /// Let the worker finish every command already sent, then wait for it.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.request_shutdown();
        self.worker_handle.await.map_err(SyncError::WorkerJoin)
    }
}

/// Builder for [`SyncScheduler`].
///
/// A remote and a reachability probe are required. The cache and queue
/// default to in-memory stores, which suits guest sessions.
pub struct SyncSchedulerBuilder<Tz: TimeZone = Local> {
    user_id: String,
    config: SyncConfig,
    reconciler: ProgressReconciler<Tz>,
    cache: Option<Arc<dyn StatsCache>>,
    queue: Option<Arc<dyn WriteQueueRepository>>,
    remote: Option<Arc<dyn StatsRemote>>,
    probe: Option<Arc<dyn Reachability>>,
}

impl SyncSchedulerBuilder<Local> {
    fn new(user_id: String) -> Self {
        Self {
            user_id,
            config: SyncConfig::default(),
            reconciler: ProgressReconciler::default(),
            cache: None,
            queue: None,
            remote: None,
            probe: None,
        }
    }
}

impl<Tz> SyncSchedulerBuilder<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
{
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the reconciler, e.g. to evaluate streak days in a fixed zone.
    pub fn reconciler<Other: TimeZone>(
        self,
        reconciler: ProgressReconciler<Other>,
    ) -> SyncSchedulerBuilder<Other> {
        SyncSchedulerBuilder {
            user_id: self.user_id,
            config: self.config,
            reconciler,
            cache: self.cache,
            queue: self.queue,
            remote: self.remote,
            probe: self.probe,
        }
    }

    pub fn cache(mut self, cache: impl StatsCache + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    pub fn write_queue(mut self, queue: impl WriteQueueRepository + 'static) -> Self {
        self.queue = Some(Arc::new(queue));
        self
    }

    pub fn remote(mut self, remote: impl StatsRemote + 'static) -> Self {
        self.remote = Some(Arc::new(remote));
        self
    }

    pub fn probe(mut self, probe: impl Reachability + 'static) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    /// Load local state, spawn the worker and return the running scheduler.
    ///
    /// Must be called from within a Tokio runtime. The first probe and sync
    /// pass run in the background; reads are served from the cache at once.
    pub fn initialize(self) -> Result<SyncScheduler<Tz>> {
        let remote = self.remote.ok_or(SyncError::MissingRemote)?;
        let probe = self.probe.ok_or(SyncError::MissingProbe)?;
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(InMemoryStatsCache::new()));
        let queue_repo = self
            .queue
            .unwrap_or_else(|| Arc::new(InMemoryWriteQueue::new()));

        let reconciler = Arc::new(self.reconciler);
        let store = {
            let reconciler = Arc::clone(&reconciler);
            LocalStore::open(&self.user_id, cache, move |record| reconciler.restore(record))
        };

        let queue = queue_repo.load(&self.user_id).unwrap_or_else(|err| {
            // the next persist would overwrite the unreadable queue, so keep a copy first
            warn!("Failed to load write queue for {}: {}", self.user_id, err);
            if let Err(err) = queue_repo.set_aside(&self.user_id) {
                warn!("Failed to set aside write queue for {}: {}", self.user_id, err);
            }
            Vec::new()
        });

        // unbounded: `write` must not wait while the worker sits in a request
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(self.config.event_buffer_size.max(1));
        let (status_tx, status_rx) = watch::channel(SyncStatus {
            pending_writes: queue.len(),
            ..SyncStatus::default()
        });
        let destroyed = Arc::new(AtomicBool::new(false));
        let refresh_requested = Arc::new(AtomicBool::new(false));

        let worker = SyncWorker::new(
            self.user_id.clone(),
            self.config.clone(),
            Arc::clone(&reconciler),
            store.clone(),
            WorkerDeps {
                remote,
                probe,
                queue_repo,
            },
            queue,
            command_rx,
            event_tx.clone(),
            status_tx,
            Arc::clone(&destroyed),
            Arc::clone(&refresh_requested),
        );
        let worker_handle = tokio::spawn(worker.run());

        let handle = SyncHandle::new(
            self.user_id,
            self.config,
            reconciler,
            store,
            command_tx,
            event_tx,
            status_rx,
            destroyed,
            refresh_requested,
        );

        Ok(SyncScheduler {
            handle,
            worker_handle,
        })
    }
}
