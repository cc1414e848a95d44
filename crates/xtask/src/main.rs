//! Development tasks for the progress workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod dirs;

use anyhow::Result;
use clap::Parser;
use commands::{Clean, ReadCache, ReadQueue, TailLogs};

/// Development tasks for the progress workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for the progress client", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Monitor client logs in real-time
    TailLogs(TailLogs),

    /// Clean cached stats, write queues and logs
    Clean(Clean),

    /// Inspect cached stats records
    ReadCache(ReadCache),

    /// Inspect pending write queues
    ReadQueue(ReadQueue),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for STATS_DATA_DIR and other env vars)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Command::TailLogs(cmd) => cmd.execute(),
        Command::Clean(cmd) => cmd.execute(),
        Command::ReadCache(cmd) => cmd.execute(),
        Command::ReadQueue(cmd) => cmd.execute(),
    }
}
