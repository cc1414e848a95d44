//! Game session input and its sanitized form.

use chrono::{DateTime, Utc};

use crate::sanitize;
use crate::snapshot::UserStatsSnapshot;

/// Raw result of a finished lesson or mini-game, as reported by the caller.
///
/// Every field is optional and unchecked. Nothing reads these values before
/// [`SessionResult::sanitize`] has turned them into a [`SanitizedSession`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct SessionResult {
    #[cfg_attr(feature = "serde", serde(deserialize_with = "sanitize::de::number"))]
    pub xp_earned: Option<f64>,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "sanitize::de::number"))]
    pub diamonds_earned: Option<f64>,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "sanitize::de::number"))]
    pub hearts_remaining: Option<f64>,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "sanitize::de::number"))]
    pub correct_answers: Option<f64>,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "sanitize::de::number"))]
    pub wrong_answers: Option<f64>,
    /// Seconds spent in the session.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "sanitize::de::number"))]
    pub time_spent: Option<f64>,
    /// Accuracy of this session alone, 0-100.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "sanitize::de::number"))]
    pub accuracy: Option<f64>,
}

/// Session deltas after coercion. All reconciler arithmetic uses this type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SanitizedSession {
    pub xp_earned: u64,
    pub diamonds_earned: u64,
    /// Hearts left at the end of the session; the current hearts when unreported.
    pub hearts_remaining: u32,
    pub correct_answers: u64,
    pub wrong_answers: u64,
    pub time_spent: u64,
    /// The current aggregate accuracy when unreported.
    pub accuracy: u8,
}

/// Informational record of the last session, stored on the snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct GameResults {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub session: SanitizedSession,
    pub leveled_up: bool,
    pub played_at: DateTime<Utc>,
}

impl SessionResult {
    /// Session that only awards XP.
    pub fn with_xp(xp_earned: f64) -> Self {
        Self {
            xp_earned: Some(xp_earned),
            ..Self::default()
        }
    }

    /// Coerce every field against the snapshot the session applies to.
    ///
    /// Cumulative deltas that are missing, negative or non-finite become 0.
    /// Standing values (hearts, accuracy) fall back to `current`.
    pub fn sanitize(&self, current: &UserStatsSnapshot) -> SanitizedSession {
        SanitizedSession {
            xp_earned: sanitize::count(self.xp_earned).unwrap_or(0),
            diamonds_earned: sanitize::count(self.diamonds_earned).unwrap_or(0),
            hearts_remaining: sanitize::small_count(self.hearts_remaining)
                .unwrap_or(current.hearts),
            correct_answers: sanitize::count(self.correct_answers).unwrap_or(0),
            wrong_answers: sanitize::count(self.wrong_answers).unwrap_or(0),
            time_spent: sanitize::count(self.time_spent).unwrap_or(0),
            accuracy: sanitize::percentage(self.accuracy).unwrap_or(current.accuracy),
        }
    }
}

impl SanitizedSession {
    pub fn answered(&self) -> u64 {
        self.correct_answers.saturating_add(self.wrong_answers)
    }
}
