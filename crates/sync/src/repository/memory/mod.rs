//! In-memory repositories for tests and guest sessions.
mod cache;
mod queue;

pub use cache::InMemoryStatsCache;
pub use queue::InMemoryWriteQueue;
