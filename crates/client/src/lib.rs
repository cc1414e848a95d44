//! `progress` client: one command against a per-user sync scheduler.
//!
//! ```text
//! main (config, logging)
//!   └─→ SchedulerBuilder (progress-bootstrap)
//!         └─→ Client::run(command)
//!               └─→ SyncScheduler / SyncHandle (progress-sync)
//! ```
//!
//! Every command ends with a graceful scheduler shutdown so queued writes are
//! on disk before the process exits.

mod builder;
pub mod cli;
pub mod render;

pub use builder::ClientBuilder;

use std::io::Write;

use anyhow::{Context, Result, bail};
use progress_core::SessionResult;
use progress_sync::SyncScheduler;
use tokio::sync::broadcast::error::RecvError;

use crate::cli::Command;

/// Top-level client container.
pub struct Client {
    scheduler: SyncScheduler,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Execute `command`, writing human-readable output to `out`, then shut
    /// the scheduler down.
    pub async fn run(self, command: Command, out: &mut (dyn Write + Send)) -> Result<()> {
        let result = self.execute(command, out).await;

        let shutdown = self.scheduler.shutdown().await;
        result?;
        shutdown.context("Sync scheduler did not shut down cleanly")?;

        tracing::info!("Client shutdown complete");
        Ok(())
    }

    async fn execute(&self, command: Command, out: &mut (dyn Write + Send)) -> Result<()> {
        match command {
            Command::Status => self.status(out).await,
            Command::Play(args) => self.play(&SessionResult::from(&args), out).await,
            Command::Sync => {
                let report = self.scheduler.force_sync().await?;
                writeln!(out, "{}", render::report(&report))?;
                Ok(())
            }
            Command::Watch => self.watch(out).await,
            Command::Wipe { yes } => {
                if !yes {
                    bail!(
                        "Refusing to wipe data for '{}' without --yes",
                        self.scheduler.user_id()
                    );
                }
                self.scheduler.wipe_account_data().await?;
                writeln!(out, "Wiped local data for {}", self.scheduler.user_id())?;
                Ok(())
            }
        }
    }

    async fn status(&self, out: &mut (dyn Write + Send)) -> Result<()> {
        // Barrier: the startup pass has finished once the worker answers.
        self.scheduler.pending_writes().await?;

        let handle = self.scheduler.handle();
        let snapshot = handle.read();
        let progress = handle.progress();
        let status = handle.status();
        writeln!(out, "{}", render::status(&snapshot, &progress, &status))?;
        Ok(())
    }

    async fn play(&self, session: &SessionResult, out: &mut (dyn Write + Send)) -> Result<()> {
        let outcome = self.scheduler.write(session).await?;
        let pending = self.scheduler.pending_writes().await?;

        writeln!(out, "{}", render::outcome(&outcome))?;
        if pending > 0 {
            writeln!(out, "  {pending} write(s) waiting for the server")?;
        }
        Ok(())
    }

    async fn watch(&self, out: &mut (dyn Write + Send)) -> Result<()> {
        let mut events = self.scheduler.subscribe();
        writeln!(out, "Watching {} (Ctrl-C to stop)", self.scheduler.user_id())?;
        out.flush()?;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => {
                        writeln!(out, "{}", render::event(&event))?;
                        out.flush()?;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Event stream lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        Ok(())
    }
}
