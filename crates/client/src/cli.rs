//! Command-line surface of the `progress` binary.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use progress_core::SessionResult;

/// Track XP, levels and streaks, synced with the stats API
#[derive(Parser, Debug)]
#[command(name = "progress")]
#[command(version, long_about = None)]
pub struct Cli {
    /// User id (overrides STATS_USER_ID; guest when neither is set)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Directory for cached stats and the write queue (overrides STATS_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the current level, progress and sync state
    Status,

    /// Record a finished lesson or mini-game
    Play(PlayArgs),

    /// Probe, push pending writes and refresh from the server
    Sync,

    /// Print sync events until interrupted
    Watch,

    /// Delete cached stats and pending writes for this user
    Wipe {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

/// Session values as reported by the game. Omitted values are treated as
/// unreported; malformed ones are sanitized, not rejected.
#[derive(Args, Debug, Clone, Default)]
pub struct PlayArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub xp: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub diamonds: Option<f64>,

    /// Hearts left at the end of the session
    #[arg(long, allow_hyphen_values = true)]
    pub hearts: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub correct: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub wrong: Option<f64>,

    /// Seconds spent in the session
    #[arg(long, allow_hyphen_values = true)]
    pub time: Option<f64>,

    /// Session accuracy, 0-100
    #[arg(long, allow_hyphen_values = true)]
    pub accuracy: Option<f64>,
}

impl From<&PlayArgs> for SessionResult {
    fn from(args: &PlayArgs) -> Self {
        SessionResult {
            xp_earned: args.xp,
            diamonds_earned: args.diamonds,
            hearts_remaining: args.hearts,
            correct_answers: args.correct,
            wrong_answers: args.wrong,
            time_spent: args.time,
            accuracy: args.accuracy,
        }
    }
}
