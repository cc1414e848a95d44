//! Deterministic leveling and progress rules shared across clients.
//!
//! `progress-core` defines the XP curve, the level reward table, the durable
//! stats snapshot and the reconciler that folds a finished game session into
//! it. Everything here is pure: no I/O, no clocks (callers pass `now`), no
//! global state. All snapshot mutation flows through
//! [`reconcile::ProgressReconciler`].
pub mod config;
pub mod curve;
pub mod error;
pub mod reconcile;
pub mod rewards;
pub mod sanitize;
pub mod session;
pub mod snapshot;

pub use config::XpCurveConfig;
pub use curve::{LevelProgress, LevelResolution, XpCurve};
pub use error::CurveConfigError;
pub use reconcile::{ProgressReconciler, ReconcileOutcome, StreakChange};
pub use rewards::{LevelRewards, rewards_for_level, rewards_for_range};
pub use session::{GameResults, SanitizedSession, SessionResult};
pub use snapshot::{StatsRecord, UserStatsSnapshot};
