//! Clean cached stats, write queues and logs
//!
//! Safety: prompts for confirmation before deleting anything.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use progress_sync::{FileStatsCache, FileWriteQueue, StatsCache, WriteQueueRepository};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::dirs;

/// Clean cached stats, write queues and logs
#[derive(Parser, Debug)]
pub struct Clean {
    /// Clean only logs
    #[arg(long)]
    pub logs: bool,

    /// Clean only cached stats and queues
    #[arg(long)]
    pub data: bool,

    /// Only clean the cache and queue of this user (implies --data)
    #[arg(long)]
    pub user: Option<String>,

    /// Custom data directory (defaults to STATS_DATA_DIR or the platform location)
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Skip confirmation prompt (dangerous!)
    #[arg(short = 'y', long)]
    pub yes: bool,
}

enum Target {
    Dir(PathBuf),
    User { data_dir: PathBuf, user_id: String },
}

impl Clean {
    pub fn execute(self) -> Result<()> {
        if self.user.is_some() && self.logs {
            anyhow::bail!("--user cannot be combined with --logs");
        }

        // No flags cleans both; --user narrows to one user's data
        let clean_logs = self.user.is_none() && (self.logs || !self.data);
        let clean_data = self.user.is_some() || self.data || !self.logs;

        let mut targets = Vec::new();

        if clean_logs {
            let log_dir = dirs::log_dir();
            if log_dir.exists() {
                targets.push(("All logs".to_string(), Target::Dir(log_dir)));
            }
        }

        if clean_data {
            let data_dir = dirs::data_dir(self.data_dir.as_deref());
            if data_dir.exists() {
                match &self.user {
                    Some(user_id) => targets.push((
                        format!("Stats and queue of {}", user_id),
                        Target::User {
                            data_dir,
                            user_id: user_id.clone(),
                        },
                    )),
                    None => targets.push(("All cached stats".to_string(), Target::Dir(data_dir))),
                }
            }
        }

        if targets.is_empty() {
            println!(
                "{}",
                style("Nothing to clean - directories don't exist yet").dim()
            );
            return Ok(());
        }

        println!("{}", style("🧹 Clean progress client data").yellow().bold());
        println!();
        println!("The following will be deleted:");
        for (label, target) in &targets {
            let path = match target {
                Target::Dir(path) | Target::User { data_dir: path, .. } => path,
            };
            println!("  {} {}", style("→").cyan(), style(label).bold());
            println!("    {}", style(path.display()).dim());
        }
        println!();

        if !self.yes && !confirm()? {
            println!("{}", style("Cancelled").dim());
            return Ok(());
        }

        for (label, target) in targets {
            print!("Deleting {}... ", label);
            io::stdout().flush()?;
            remove(&target)?;
            println!("{}", style("✓").green());
        }

        println!();
        println!("{}", style("✓ Cleanup complete!").green().bold());

        Ok(())
    }
}

fn remove(target: &Target) -> Result<()> {
    match target {
        Target::Dir(path) => std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to delete: {}", path.display())),
        Target::User { data_dir, user_id } => {
            FileStatsCache::new(data_dir)?.delete(user_id)?;
            FileWriteQueue::new(data_dir)?.save(user_id, &[])?;
            Ok(())
        }
    }
}

/// Prompt user for confirmation
fn confirm() -> Result<bool> {
    print!("{} ", style("Proceed? [y/N]").yellow().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
