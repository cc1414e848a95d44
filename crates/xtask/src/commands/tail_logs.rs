//! Tail client logs command
//!
//! Follows `client.log` like `tail -f`, starting with the last few lines.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

use crate::dirs;

/// Monitor client logs in real-time
#[derive(Parser, Debug)]
pub struct TailLogs {
    /// Number of lines to show from history before tailing
    #[arg(short = 'n', long, default_value = "10")]
    pub lines: usize,

    /// Poll interval in milliseconds
    #[arg(long, default_value = "100")]
    pub poll_interval: u64,
}

impl TailLogs {
    pub fn execute(self) -> Result<()> {
        let log_path = dirs::log_file();

        if !log_path.exists() {
            eprintln!("{}", style("✗ Log file not found").red().bold());
            eprintln!("  Path: {}", style(log_path.display()).dim());
            eprintln!();
            eprintln!("  Run the client first to generate logs:");
            eprintln!("    {}", style("cargo run -p progress-client -- status").cyan());
            anyhow::bail!("Log file does not exist");
        }

        println!("{}", style("📝 Monitoring progress client logs").green().bold());
        println!("  Log file: {}", style(log_path.display()).dim());
        println!();

        self.tail_file(&log_path)
    }

    /// Print the last N lines, then follow new content
    fn tail_file(&self, path: &Path) -> Result<()> {
        let mut file = File::open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        for line in last_lines(&mut file, self.lines)? {
            println!("{}", line);
        }

        let mut reader = BufReader::new(file);
        let poll_interval = Duration::from_millis(self.poll_interval);

        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => std::thread::sleep(poll_interval),
                Ok(_) => print!("{}", line),
                Err(e) => {
                    eprintln!("{}", style(format!("Error reading log file: {}", e)).red());
                    anyhow::bail!("Failed to read log file");
                }
            }
        }
    }
}

/// Read the last `n` lines, leaving the cursor at the end of the file.
fn last_lines(file: &mut File, n: usize) -> Result<Vec<String>> {
    file.seek(SeekFrom::Start(0))?;

    let lines: Vec<String> = BufReader::new(&mut *file)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .context("Failed to read lines from log file")?;

    file.seek(SeekFrom::End(0))?;
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].to_vec())
}
