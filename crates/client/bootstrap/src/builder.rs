//! Builds the sync scheduler and its collaborators from a [`ClientConfig`].
use std::path::PathBuf;

use anyhow::{Context, Result};
use progress_core::{ProgressReconciler, XpCurve};
use progress_sync::{
    FileStatsCache, FileWriteQueue, HttpProbe, HttpStatsRemote, InMemoryStatsRemote, ManualProbe,
    SyncScheduler,
};

use crate::config::ClientConfig;

/// Assembles a file-backed scheduler talking to the configured API.
///
/// Without a base URL the scheduler runs local-only: the probe always answers
/// offline, so sessions accumulate in the write queue until an API is
/// configured.
pub struct SchedulerBuilder {
    config: ClientConfig,
}

impl SchedulerBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Build and start the scheduler. Must run inside a Tokio runtime.
    pub fn build(self) -> Result<SchedulerSetup> {
        let curve =
            XpCurve::new(self.config.curve.clone()).context("Invalid XP curve configuration")?;

        let data_dir = self.config.data_dir();
        let cache = FileStatsCache::new(&data_dir)
            .with_context(|| format!("Failed to open stats cache at {}", data_dir.display()))?;
        let queue = FileWriteQueue::new(&data_dir)
            .with_context(|| format!("Failed to open write queue at {}", data_dir.display()))?;

        let builder = SyncScheduler::builder(self.config.user_id())
            .config(self.config.sync.clone())
            .reconciler(ProgressReconciler::new(curve))
            .cache(cache)
            .write_queue(queue);

        let api = &self.config.api;
        let builder = match api.base_url.as_deref() {
            Some(base_url) => {
                let remote = HttpStatsRemote::new(base_url, api.request_timeout)
                    .context("Invalid STATS_API_BASE_URL")?;
                let health_url = api.resolved_health_url();
                let probe = HttpProbe::new(
                    health_url.as_deref(),
                    api.probe_fallback_url.as_deref(),
                    api.probe_timeout,
                )
                .context("Invalid reachability probe URL")?;

                tracing::info!("Stats API: {}", remote.base_url());
                builder.remote(remote).probe(probe)
            }
            None => {
                tracing::warn!("STATS_API_BASE_URL not set; running local-only");
                builder
                    .remote(InMemoryStatsRemote::new())
                    .probe(ManualProbe::offline())
            }
        };

        let scheduler = builder
            .initialize()
            .context("Failed to start sync scheduler")?;

        tracing::info!(
            "Sync scheduler ready: user={}, data_dir={}",
            self.config.user_id(),
            data_dir.display()
        );

        Ok(SchedulerSetup {
            config: self.config,
            data_dir,
            scheduler,
        })
    }
}

pub struct SchedulerSetup {
    pub config: ClientConfig,
    pub data_dir: PathBuf,
    pub scheduler: SyncScheduler,
}

#[cfg(test)]
mod tests {
    use super::*;
    use progress_core::{SessionResult, XpCurveConfig};
    use tempfile::TempDir;

    fn local_config(dir: &TempDir) -> ClientConfig {
        ClientConfig {
            user_id: Some("learner-1".into()),
            data_dir: Some(dir.path().to_path_buf()),
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn local_only_setup_queues_writes_on_disk() {
        let dir = TempDir::new().unwrap();
        let setup = SchedulerBuilder::new(local_config(&dir))
            .build()
            .expect("local-only setup should build");

        let scheduler = setup.scheduler;
        scheduler
            .write(&SessionResult::with_xp(30.0))
            .await
            .unwrap();
        assert_eq!(scheduler.pending_writes().await.unwrap(), 1);
        scheduler.shutdown().await.unwrap();

        assert!(dir.path().join("stats_learner-1.json").exists());
        assert!(dir.path().join("queue_learner-1.json").exists());
    }

    #[tokio::test]
    async fn invalid_curve_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = ClientConfig {
            curve: XpCurveConfig::new(100, 0.9, 5),
            ..local_config(&dir)
        };

        assert!(SchedulerBuilder::new(config).build().is_err());
    }

    #[tokio::test]
    async fn invalid_base_url_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = local_config(&dir);
        config.api.base_url = Some("not a url".into());

        assert!(SchedulerBuilder::new(config).build().is_err());
    }
}
