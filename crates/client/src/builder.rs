//! Client builder.

use anyhow::{Context, Result};
use progress_sync::SyncScheduler;

use crate::Client;

/// Builder for a [`Client`]. The scheduler is required and normally comes
/// from `progress_bootstrap::SchedulerBuilder`.
#[derive(Default)]
pub struct ClientBuilder {
    scheduler: Option<SyncScheduler>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler(mut self, scheduler: SyncScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn build(self) -> Result<Client> {
        let scheduler = self
            .scheduler
            .context("Scheduler is required. Use .scheduler() to set it.")?;

        Ok(Client { scheduler })
    }
}
