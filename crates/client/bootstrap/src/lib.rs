//! Shared bootstrap utilities for client front-ends.
//!
//! Provides configuration loading, platform directories, and scheduler setup
//! that can be reused by the CLI, a UI shell, or developer tooling.
pub mod builder;
pub mod config;
pub mod dirs;

pub use builder::{SchedulerBuilder, SchedulerSetup};
pub use config::{ApiConfig, ClientConfig};
