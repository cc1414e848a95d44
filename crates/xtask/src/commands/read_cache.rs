//! Read and inspect cached stats records
//!
//! Loads `stats_{user}.json` files the way the client does and shows the
//! derived level next to the stored one.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use progress_bootstrap::ClientConfig;
use progress_core::{StatsRecord, UserStatsSnapshot, XpCurve};
use progress_sync::{FileStatsCache, StatsCache};

use crate::dirs;

/// Inspect cached stats records
#[derive(Parser)]
pub struct ReadCache {
    /// User to inspect; lists every cached user when omitted
    #[arg(value_name = "USER")]
    user: Option<String>,

    /// Custom data directory (defaults to STATS_DATA_DIR or the platform location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Level, XP and streak summary
    Summary,
    /// Raw record as stored
    Json,
}

impl ReadCache {
    pub fn execute(self) -> Result<()> {
        let data_dir = dirs::data_dir(self.data_dir.as_deref());
        let cache = FileStatsCache::new(&data_dir)
            .with_context(|| format!("Failed to open cache at {}", data_dir.display()))?;
        let curve = XpCurve::new(ClientConfig::from_env().curve)
            .context("Invalid XP curve configuration")?;

        let users = match self.user {
            Some(user) => vec![user],
            None => cache.list_users()?,
        };

        if users.is_empty() {
            println!(
                "{} {}",
                style("No cached users in").dim(),
                style(data_dir.display()).dim()
            );
            return Ok(());
        }

        for user in users {
            let record = cache
                .load(&user)
                .with_context(|| format!("Failed to read cached stats for {}", user))?;
            let Some(record) = record else {
                println!("{} {}", style("✗ No cached stats for").red(), style(&user).cyan());
                continue;
            };

            match self.format {
                OutputFormat::Summary => print_summary(&record, &curve),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
            }
        }

        Ok(())
    }
}

fn print_summary(record: &StatsRecord, curve: &XpCurve) {
    let stored_level = record.level;
    let snapshot = UserStatsSnapshot::from_record(record.clone(), None, curve);
    let progress = snapshot.progress(curve);

    println!("{}", style(&snapshot.user_id).bold().green());
    println!(
        "  Level:    {} ({}% to next, {} XP left)",
        snapshot.level(),
        progress.percent,
        progress.to_next
    );
    if let Some(stored) = stored_level
        && stored != snapshot.level()
    {
        println!(
            "  {}",
            style(format!("stored level {} disagrees with XP", stored)).yellow()
        );
    }
    println!("  XP:       {}", snapshot.xp());
    println!("  Diamonds: {}", snapshot.diamonds);
    println!("  Hearts:   {}/{}", snapshot.hearts, snapshot.max_hearts);
    println!("  Streak:   {} (best {})", snapshot.streak, snapshot.max_streak);
    println!("  Sessions: {}", snapshot.total_sessions);
    match snapshot.last_played {
        Some(at) => println!("  Played:   {}", at.to_rfc3339()),
        None => println!("  Played:   {}", style("never").dim()),
    }
    println!();
}
