//! Sync worker: probe, drain the queue in order, then fetch and merge.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use progress_core::{ProgressReconciler, StatsRecord};

use crate::api::{Connectivity, Result, SyncEvent, SyncPhase, SyncReport, SyncStatus, publish};
use crate::remote::{Reachability, RemoteError, StatsRemote};
use crate::repository::WriteQueueRepository;
use crate::scheduler::SyncConfig;
use crate::store::LocalStore;
use crate::types::{PendingWrite, SyncQueueEntry};

const MIN_SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Commands sent by [`SyncHandle`](crate::SyncHandle).
pub(crate) enum Command {
    /// Deliver writes produced by a local session, queueing what fails.
    Push {
        writes: Vec<PendingWrite>,
        enqueued_at: DateTime<Utc>,
    },
    /// A read found the snapshot stale.
    Refresh,
    /// Probe immediately and run a full pass.
    SyncNow { reply: oneshot::Sender<SyncReport> },
    PendingWrites { reply: oneshot::Sender<usize> },
    Wipe { reply: oneshot::Sender<Result<()>> },
    Shutdown,
}

enum Refresh {
    Fetched,
    /// 404 answered by uploading the local snapshot.
    Seeded,
    Failed,
}

/// Network and persistence collaborators of the worker.
pub(crate) struct WorkerDeps {
    pub remote: Arc<dyn StatsRemote>,
    pub probe: Arc<dyn Reachability>,
    pub queue_repo: Arc<dyn WriteQueueRepository>,
}

pub(crate) struct SyncWorker<Tz: TimeZone> {
    user_id: String,
    config: SyncConfig,
    reconciler: Arc<ProgressReconciler<Tz>>,
    store: LocalStore,
    deps: WorkerDeps,
    queue: VecDeque<SyncQueueEntry>,
    connectivity: Connectivity,
    last_probe: Option<Instant>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: broadcast::Sender<SyncEvent>,
    status_tx: watch::Sender<SyncStatus>,
    destroyed: Arc<AtomicBool>,
    refresh_requested: Arc<AtomicBool>,
}

impl<Tz> SyncWorker<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        user_id: String,
        config: SyncConfig,
        reconciler: Arc<ProgressReconciler<Tz>>,
        store: LocalStore,
        deps: WorkerDeps,
        queue: Vec<SyncQueueEntry>,
        command_rx: mpsc::UnboundedReceiver<Command>,
        event_tx: broadcast::Sender<SyncEvent>,
        status_tx: watch::Sender<SyncStatus>,
        destroyed: Arc<AtomicBool>,
        refresh_requested: Arc<AtomicBool>,
    ) -> Self {
        Self {
            user_id,
            config,
            reconciler,
            store,
            deps,
            queue: queue.into(),
            connectivity: Connectivity::Unknown,
            last_probe: None,
            command_rx,
            event_tx,
            status_tx,
            destroyed,
            refresh_requested,
        }
    }

    /// Main worker loop.
    ///
    /// Probes once, runs an initial pass, then alternates between commands
    /// and periodic passes. Ticks that fall due while a pass is running are
    /// skipped rather than stacked.
    pub(crate) async fn run(mut self) {
        info!(user_id = %self.user_id, pending = self.queue.len(), "Sync worker started");
        self.publish_status();

        self.probe_now().await;
        if !self.is_destroyed() {
            self.sync_pass().await;
        }

        let period = self.config.sync_interval.max(MIN_SYNC_INTERVAL);
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.is_destroyed() {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                _ = ticker.tick() => {
                    self.sync_pass().await;
                }
            }
        }

        info!(user_id = %self.user_id, pending = self.queue.len(), "Sync worker stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Push {
                writes,
                enqueued_at,
            } => self.push(writes, enqueued_at).await,
            Command::Refresh => {
                self.refresh_requested.store(false, Ordering::SeqCst);
                if !self.store.is_fresh(self.config.freshness) {
                    self.sync_pass().await;
                }
            }
            Command::SyncNow { reply } => {
                self.last_probe = None;
                let report = self.sync_pass().await;
                let _ = reply.send(report);
            }
            Command::PendingWrites { reply } => {
                let _ = reply.send(self.queue.len());
            }
            Command::Wipe { reply } => {
                let _ = reply.send(self.wipe());
            }
            Command::Shutdown => {}
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    async fn push(&mut self, writes: Vec<PendingWrite>, enqueued_at: DateTime<Utc>) {
        for payload in writes {
            self.queue
                .push_back(SyncQueueEntry::new(payload, enqueued_at));
        }
        self.persist_queue();

        if self.connectivity.is_online() {
            self.drain_queue().await;
        } else {
            debug!("Offline; holding {} writes for {}", self.queue.len(), self.user_id);
        }

        if !self.queue.is_empty() && !self.is_destroyed() {
            publish(
                &self.event_tx,
                SyncEvent::WriteQueued {
                    user_id: self.user_id.clone(),
                    pending: self.queue.len(),
                },
            );
        }
        self.publish_status();
    }

    /// One probe (when due), drain, fetch cycle.
    async fn sync_pass(&mut self) -> SyncReport {
        let mut report = SyncReport {
            connectivity: self.connectivity,
            drained: 0,
            remaining: self.queue.len(),
            fetched: false,
            seeded: false,
        };

        if self.probe_due() {
            self.probe_now().await;
        }
        if self.is_destroyed() || !self.connectivity.is_online() {
            report.connectivity = self.connectivity;
            return report;
        }

        self.set_phase(SyncPhase::Syncing);

        report.drained = self.drain_queue().await;
        if self.queue.is_empty() && self.connectivity.is_online() && !self.is_destroyed() {
            match self.refresh().await {
                Refresh::Fetched => report.fetched = true,
                Refresh::Seeded => {
                    report.seeded = true;
                    report.drained += 1;
                }
                Refresh::Failed => {}
            }
        }

        report.connectivity = self.connectivity;
        report.remaining = self.queue.len();

        if report.drained > 0 || report.fetched {
            self.status_tx
                .send_modify(|status| status.last_synced_at = Some(Utc::now()));
        }
        self.set_phase(SyncPhase::Idle);

        debug!(
            user_id = %self.user_id,
            drained = report.drained,
            remaining = report.remaining,
            fetched = report.fetched,
            seeded = report.seeded,
            "Sync pass finished"
        );
        report
    }

    fn probe_due(&self) -> bool {
        self.last_probe
            .is_none_or(|at| at.elapsed() >= self.config.probe_interval)
    }

    async fn probe_now(&mut self) {
        self.set_phase(SyncPhase::Probing);
        let connectivity = self.deps.probe.probe().await;
        self.last_probe = Some(Instant::now());

        if !self.is_destroyed() {
            self.set_connectivity(connectivity);
        }
        self.set_phase(SyncPhase::Idle);
    }

    /// Deliver queued writes oldest first, stopping at the first failure.
    ///
    /// The failed entry and everything behind it stay queued in order.
    async fn drain_queue(&mut self) -> usize {
        let mut drained = 0;

        while let Some(entry) = self.queue.front() {
            let payload = entry.payload.clone();
            let (_, revision) = self.store.read();

            let result = Self::deliver(self.deps.remote.as_ref(), &payload).await;
            if self.is_destroyed() {
                return drained;
            }

            match result {
                Ok(stored) => {
                    self.queue.pop_front();
                    drained += 1;
                    self.persist_queue();
                    publish(
                        &self.event_tx,
                        SyncEvent::WritePushed {
                            user_id: self.user_id.clone(),
                        },
                    );

                    if let Some(record) = stored
                        && self.queue.is_empty()
                    {
                        self.adopt(revision, record);
                    }
                }
                Err(err) => {
                    warn!(
                        "Failed to deliver write for {} ({} pending): {}",
                        self.user_id,
                        self.queue.len(),
                        err
                    );
                    if err.is_transient() {
                        self.set_connectivity(Connectivity::Offline);
                    }
                    break;
                }
            }
        }

        if drained > 0 {
            info!(
                user_id = %self.user_id,
                drained,
                remaining = self.queue.len(),
                "Drained write queue"
            );
            publish(
                &self.event_tx,
                SyncEvent::QueueDrained {
                    user_id: self.user_id.clone(),
                    drained,
                    remaining: self.queue.len(),
                },
            );
        }
        self.publish_status();
        drained
    }

    async fn deliver(
        remote: &dyn StatsRemote,
        payload: &PendingWrite,
    ) -> std::result::Result<Option<StatsRecord>, RemoteError> {
        match payload {
            PendingWrite::Snapshot(record) => remote.push_stats(record).await.map(Some),
            PendingWrite::Session(report) => remote.finish_session(report).await.map(|()| None),
        }
    }

    /// Fetch the server record and merge it into the local snapshot.
    async fn refresh(&mut self) -> Refresh {
        let (local, revision) = self.store.read();

        let result = self.deps.remote.fetch_stats(&self.user_id).await;
        if self.is_destroyed() {
            return Refresh::Failed;
        }

        match result {
            Ok(record) => {
                self.adopt(revision, record);
                self.store.mark_fetched();
                Refresh::Fetched
            }
            Err(err) if err.is_not_found() => {
                info!("No server stats for {} yet; uploading local snapshot", self.user_id);
                self.queue.push_back(SyncQueueEntry::new(
                    PendingWrite::Snapshot(local.to_record()),
                    Utc::now(),
                ));
                self.persist_queue();
                if self.drain_queue().await > 0 {
                    // the server now holds exactly the local snapshot
                    self.store.mark_fetched();
                    Refresh::Seeded
                } else {
                    Refresh::Failed
                }
            }
            Err(err) => {
                warn!("Failed to fetch stats for {}: {}", self.user_id, err);
                if err.is_transient() {
                    self.set_connectivity(Connectivity::Offline);
                }
                Refresh::Failed
            }
        }
    }

    /// Merge a server record read while the store was at `revision`.
    fn adopt(&self, revision: u64, record: StatsRecord) {
        let local = self.store.snapshot();
        let merged = self
            .reconciler
            .merge_remote(&local, record, !self.queue.is_empty());

        if self.store.replace_if_unchanged(revision, merged) {
            let snapshot = self.store.snapshot();
            publish(
                &self.event_tx,
                SyncEvent::Refreshed {
                    user_id: self.user_id.clone(),
                    xp: snapshot.xp(),
                    level: snapshot.level(),
                },
            );
        } else {
            debug!("Local write landed during request; keeping local snapshot for {}", self.user_id);
        }
    }

    fn wipe(&mut self) -> Result<()> {
        self.queue.clear();
        self.deps.queue_repo.save(&self.user_id, &[])?;
        self.store.reset();
        self.publish_status();

        info!("Wiped local stats and pending writes for {}", self.user_id);
        Ok(())
    }

    fn persist_queue(&mut self) {
        let entries = self.queue.make_contiguous();
        if let Err(err) = self.deps.queue_repo.save(&self.user_id, entries) {
            warn!("Failed to persist write queue for {}: {}", self.user_id, err);
        }
    }

    fn set_connectivity(&mut self, connectivity: Connectivity) {
        if self.connectivity == connectivity {
            return;
        }
        info!(user_id = %self.user_id, from = %self.connectivity, to = %connectivity, "Connectivity changed");
        self.connectivity = connectivity;
        publish(
            &self.event_tx,
            SyncEvent::ConnectivityChanged { connectivity },
        );
        self.publish_status();
    }

    fn set_phase(&self, phase: SyncPhase) {
        self.status_tx.send_modify(|status| status.phase = phase);
    }

    fn publish_status(&self) {
        let pending = self.queue.len();
        let connectivity = self.connectivity;
        self.status_tx.send_modify(|status| {
            status.connectivity = connectivity;
            status.pending_writes = pending;
        });
    }
}
