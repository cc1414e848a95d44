//! `progress` binary: composition root for the sync client.
//!
//! ```bash
//! progress status
//! progress --user learner-7 play --xp 40 --correct 9 --wrong 1 --time 95
//! STATS_API_BASE_URL=https://api.example.com progress sync
//! ```

use anyhow::Result;
use clap::Parser;
use progress_bootstrap::{ClientConfig, SchedulerBuilder, dirs};
use progress_client::Client;
use progress_client::cli::Cli;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(user) = cli.user.clone() {
        config.user_id = Some(user);
    }
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = Some(dir);
    }

    setup_logging()?;
    tracing::info!("Starting progress client: user={}", config.user_id());

    let setup = SchedulerBuilder::new(config).build()?;
    let client = Client::builder().scheduler(setup.scheduler).build()?;

    let mut stdout = std::io::stdout();
    client.run(cli.command, &mut stdout).await
}

/// Full log to `client.log` in the platform log directory, warnings to stderr.
fn setup_logging() -> Result<()> {
    let log_dir = dirs::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, dirs::LOG_FILE);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    // ANSI in the file keeps `xtask tail-logs` colorized
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(true);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    // Keep the writer alive for the whole process
    std::mem::forget(guard);

    Ok(())
}
