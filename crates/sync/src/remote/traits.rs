//! Seams between the scheduler and the network.

use async_trait::async_trait;

use progress_core::StatsRecord;

use super::RemoteError;
use crate::api::Connectivity;
use crate::types::SessionReport;

/// Stats endpoints of the backend.
///
/// The server upserts: a pushed record replaces the stored fields it carries
/// and leaves the rest untouched.
#[async_trait]
pub trait StatsRemote: Send + Sync {
    /// `GET /user/stats/{user_id}`
    async fn fetch_stats(&self, user_id: &str) -> Result<StatsRecord, RemoteError>;

    /// `POST /user/stats`, returning the server's resulting record.
    async fn push_stats(&self, record: &StatsRecord) -> Result<StatsRecord, RemoteError>;

    /// `POST /progress/finish`
    async fn finish_session(&self, report: &SessionReport) -> Result<(), RemoteError>;
}

/// Cheap "can we reach the backend" check.
///
/// Probes never fail: anything short of a successful response is `Offline`.
#[async_trait]
pub trait Reachability: Send + Sync {
    async fn probe(&self) -> Connectivity;
}
