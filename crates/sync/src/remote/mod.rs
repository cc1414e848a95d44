//! Remote stats API and reachability probing.
mod error;
mod http;
mod memory;
mod probe;
mod traits;

pub use error::RemoteError;
pub use http::HttpStatsRemote;
pub use memory::{InMemoryStatsRemote, ManualProbe, RemoteCall};
pub use probe::HttpProbe;
pub use traits::{Reachability, StatsRemote};
