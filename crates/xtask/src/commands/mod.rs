//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod clean;
mod read_cache;
mod read_queue;
mod tail_logs;

pub use clean::Clean;
pub use read_cache::ReadCache;
pub use read_queue::ReadQueue;
pub use tail_logs::TailLogs;
