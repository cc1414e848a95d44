//! Read and inspect the pending write queue of a user

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use progress_bootstrap::ClientConfig;
use progress_sync::{FileWriteQueue, PendingWrite, SyncQueueEntry, WriteQueueRepository};

use crate::dirs;

/// Inspect pending write queues
#[derive(Parser)]
pub struct ReadQueue {
    /// User whose queue to read (defaults to STATS_USER_ID or guest)
    #[arg(value_name = "USER")]
    user: Option<String>,

    /// Custom data directory (defaults to STATS_DATA_DIR or the platform location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Print the full JSON payload of every entry
    #[arg(long)]
    json: bool,
}

impl ReadQueue {
    pub fn execute(self) -> Result<()> {
        let config = ClientConfig::from_env();
        let user = self
            .user
            .clone()
            .unwrap_or_else(|| config.user_id().to_owned());

        let data_dir = dirs::data_dir(self.data_dir.as_deref());
        let queue = FileWriteQueue::new(&data_dir)
            .with_context(|| format!("Failed to open queue at {}", data_dir.display()))?;
        let entries = queue
            .load(&user)
            .with_context(|| format!("Failed to read write queue for {}", user))?;

        println!(
            "{} {} ({} pending)",
            style("Write queue:").bold().cyan(),
            style(&user).bold(),
            entries.len()
        );

        for (index, entry) in entries.iter().enumerate() {
            if self.json {
                println!("{}", serde_json::to_string_pretty(entry)?);
            } else {
                println!("  {:>3}. {}", index + 1, describe(entry));
            }
        }

        Ok(())
    }
}

fn describe(entry: &SyncQueueEntry) -> String {
    let at = entry.enqueued_at.format("%Y-%m-%d %H:%M:%S");
    match &entry.payload {
        PendingWrite::Snapshot(record) => format!(
            "{} snapshot  xp={} level={}",
            at,
            record.xp.unwrap_or_default(),
            record.level.unwrap_or_default()
        ),
        PendingWrite::Session(report) => format!(
            "{} session   +{} xp, leveled_up={}",
            at, report.results.session.xp_earned, report.results.leveled_up
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progress_core::StatsRecord;

    #[test]
    fn describes_snapshot_entries() {
        let record = StatsRecord {
            xp: Some(146),
            level: Some(2),
            ..StatsRecord::empty("learner-1")
        };
        let entry = SyncQueueEntry::new(
            PendingWrite::Snapshot(record),
            "2026-03-01T10:00:00Z".parse().unwrap(),
        );

        assert_eq!(
            describe(&entry),
            "2026-03-01 10:00:00 snapshot  xp=146 level=2"
        );
    }
}
