//! Durable user stats snapshot and its flat record form.
//!
//! `UserStatsSnapshot` is the in-memory value the reconciler replaces
//! wholesale after every session. Its level is derived: there is no way to set
//! XP without recomputing the level through the curve, so
//! `level == curve.level_for(xp)` holds for every snapshot in existence.
//!
//! `StatsRecord` is the flat shape written to the local cache and exchanged
//! with the remote API. It carries the level only because the wire format
//! does; on the way back in the stored level is used as a resolution hint and
//! nothing more.

use chrono::{DateTime, Utc};

use crate::curve::{LevelProgress, XpCurve};
use crate::session::GameResults;

#[cfg(feature = "serde")]
use crate::sanitize;

/// Stats owned by one user (or guest session).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserStatsSnapshot {
    pub user_id: String,
    xp: u64,
    level: u32,
    pub diamonds: u64,
    /// Current standing, replaced (not accumulated) by each session.
    pub hearts: u32,
    /// Informational ceiling raised on level-up. Not enforced.
    pub max_hearts: u32,
    pub streak: u32,
    pub max_streak: u32,
    /// Aggregate accuracy over every answered question, 0-100.
    pub accuracy: u8,
    pub total_sessions: u64,
    pub total_correct_answers: u64,
    pub total_wrong_answers: u64,
    /// Seconds.
    pub total_time_spent: u64,
    pub last_played: Option<DateTime<Utc>>,
    pub last_game_results: Option<GameResults>,
}

impl UserStatsSnapshot {
    pub const STARTING_HEARTS: u32 = 5;

    /// Defaults for a first sign-in or a guest session.
    pub fn new_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            xp: 0,
            level: 1,
            diamonds: 0,
            hearts: Self::STARTING_HEARTS,
            max_hearts: Self::STARTING_HEARTS,
            streak: 0,
            max_streak: 0,
            accuracy: 0,
            total_sessions: 0,
            total_correct_answers: 0,
            total_wrong_answers: 0,
            total_time_spent: 0,
            last_played: None,
            last_game_results: None,
        }
    }

    pub fn xp(&self) -> u64 {
        self.xp
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Replace the XP total and re-derive the level.
    pub fn set_xp(&mut self, xp: u64, curve: &XpCurve) {
        self.level = curve.resolve_level(xp, self.level).level;
        self.xp = xp;
    }

    pub fn progress(&self, curve: &XpCurve) -> LevelProgress {
        curve.progress(self.xp, self.level)
    }

    /// Flatten into the persisted/wire form.
    pub fn to_record(&self) -> StatsRecord {
        StatsRecord {
            user_id: self.user_id.clone(),
            xp: Some(self.xp),
            level: Some(self.level),
            diamonds: Some(self.diamonds),
            hearts: Some(self.hearts),
            max_hearts: Some(self.max_hearts),
            streak: Some(self.streak),
            max_streak: Some(self.max_streak),
            accuracy: Some(self.accuracy),
            total_sessions: Some(self.total_sessions),
            total_correct_answers: Some(self.total_correct_answers),
            total_wrong_answers: Some(self.total_wrong_answers),
            total_time_spent: Some(self.total_time_spent),
            last_played: self.last_played,
            last_game_results: self.last_game_results.clone(),
        }
    }

    /// Rebuild a snapshot from a possibly partial record.
    ///
    /// Missing fields come from `fallback` when given, otherwise from the
    /// new-user defaults. The level is recomputed from XP, using the stored
    /// level (or the fallback's) only as a hint.
    pub fn from_record(record: StatsRecord, fallback: Option<&Self>, curve: &XpCurve) -> Self {
        let base = match fallback {
            Some(snapshot) => snapshot.clone(),
            None => Self::new_user(record.user_id.clone()),
        };

        let user_id = if record.user_id.is_empty() {
            base.user_id.clone()
        } else {
            record.user_id
        };

        let xp = record.xp.unwrap_or(base.xp);
        let hint = record.level.unwrap_or(base.level);
        let streak = record.streak.unwrap_or(base.streak);

        Self {
            user_id,
            xp,
            level: curve.resolve_level(xp, hint).level,
            diamonds: record.diamonds.unwrap_or(base.diamonds),
            hearts: record.hearts.unwrap_or(base.hearts),
            max_hearts: record.max_hearts.unwrap_or(base.max_hearts),
            streak,
            max_streak: record.max_streak.unwrap_or(base.max_streak).max(streak),
            accuracy: record.accuracy.unwrap_or(base.accuracy),
            total_sessions: record.total_sessions.unwrap_or(base.total_sessions),
            total_correct_answers: record
                .total_correct_answers
                .unwrap_or(base.total_correct_answers),
            total_wrong_answers: record
                .total_wrong_answers
                .unwrap_or(base.total_wrong_answers),
            total_time_spent: record.total_time_spent.unwrap_or(base.total_time_spent),
            last_played: record.last_played.or(base.last_played),
            last_game_results: record.last_game_results.or(base.last_game_results),
        }
    }
}

/// Flat stats document as stored in the local cache and on the server.
///
/// Every field but `user_id` may be absent. Values that fail to parse
/// (strings, negatives, NaN) deserialize as absent instead of rejecting the
/// document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct StatsRecord {
    pub user_id: String,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::count", skip_serializing_if = "Option::is_none")
    )]
    pub xp: Option<u64>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::small_count", skip_serializing_if = "Option::is_none")
    )]
    pub level: Option<u32>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::count", skip_serializing_if = "Option::is_none")
    )]
    pub diamonds: Option<u64>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::small_count", skip_serializing_if = "Option::is_none")
    )]
    pub hearts: Option<u32>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::small_count", skip_serializing_if = "Option::is_none")
    )]
    pub max_hearts: Option<u32>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::small_count", skip_serializing_if = "Option::is_none")
    )]
    pub streak: Option<u32>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::small_count", skip_serializing_if = "Option::is_none")
    )]
    pub max_streak: Option<u32>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::percentage", skip_serializing_if = "Option::is_none")
    )]
    pub accuracy: Option<u8>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::count", skip_serializing_if = "Option::is_none")
    )]
    pub total_sessions: Option<u64>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::count", skip_serializing_if = "Option::is_none")
    )]
    pub total_correct_answers: Option<u64>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::count", skip_serializing_if = "Option::is_none")
    )]
    pub total_wrong_answers: Option<u64>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::count", skip_serializing_if = "Option::is_none")
    )]
    pub total_time_spent: Option<u64>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::timestamp", skip_serializing_if = "Option::is_none")
    )]
    pub last_played: Option<DateTime<Utc>>,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "sanitize::de::maybe", skip_serializing_if = "Option::is_none")
    )]
    pub last_game_results: Option<GameResults>,
}

impl StatsRecord {
    /// Record carrying nothing but the owner.
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_xp_keeps_level_derived() {
        let curve = XpCurve::default();
        let mut snapshot = UserStatsSnapshot::new_user("u1");

        snapshot.set_xp(345, &curve);
        assert_eq!(snapshot.level(), 4);

        // downward correction re-scans from level 1
        snapshot.set_xp(120, &curve);
        assert_eq!(snapshot.level(), 2);
        assert_eq!(snapshot.level(), curve.level_for(snapshot.xp()));
    }

    #[test]
    fn stored_level_is_only_a_hint() {
        let curve = XpCurve::default();
        let record = StatsRecord {
            xp: Some(50),
            level: Some(12),
            ..StatsRecord::empty("u1")
        };
        let snapshot = UserStatsSnapshot::from_record(record, None, &curve);
        assert_eq!(snapshot.level(), 1);
        assert_eq!(snapshot.xp(), 50);
    }

    #[test]
    fn partial_record_is_filled_from_fallback() {
        let curve = XpCurve::default();
        let mut local = UserStatsSnapshot::new_user("u1");
        local.set_xp(400, &curve);
        local.diamonds = 70;
        local.streak = 4;
        local.max_streak = 6;

        let remote = StatsRecord {
            diamonds: Some(90),
            streak: Some(9),
            ..StatsRecord::default()
        };
        let merged = UserStatsSnapshot::from_record(remote, Some(&local), &curve);

        assert_eq!(merged.user_id, "u1");
        assert_eq!(merged.xp(), 400);
        assert_eq!(merged.level(), 4);
        assert_eq!(merged.diamonds, 90);
        assert_eq!(merged.streak, 9);
        assert_eq!(merged.max_streak, 9);
        assert_eq!(merged.hearts, UserStatsSnapshot::STARTING_HEARTS);
    }

    #[test]
    fn record_round_trip_preserves_snapshot() {
        let curve = XpCurve::default();
        let mut snapshot = UserStatsSnapshot::new_user("u1");
        snapshot.set_xp(1_000, &curve);
        snapshot.hearts = 2;
        snapshot.total_sessions = 11;

        let rebuilt = UserStatsSnapshot::from_record(snapshot.to_record(), None, &curve);
        assert_eq!(rebuilt, snapshot);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn malformed_fields_do_not_reject_the_document() {
        let record: StatsRecord = serde_json::from_str(
            r#"{
                "userId": "u1",
                "xp": 230.0,
                "level": "seven",
                "diamonds": -12,
                "hearts": "4",
                "accuracy": 250,
                "lastPlayed": "not a date",
                "lastGameResults": 17,
                "unknownField": true
            }"#,
        )
        .unwrap();

        assert_eq!(record.user_id, "u1");
        assert_eq!(record.xp, Some(230));
        assert_eq!(record.level, None);
        assert_eq!(record.diamonds, None);
        assert_eq!(record.hearts, Some(4));
        assert_eq!(record.accuracy, Some(100));
        assert_eq!(record.last_played, None);
        assert_eq!(record.last_game_results, None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn epoch_millis_are_accepted() {
        let record: StatsRecord =
            serde_json::from_str(r#"{"userId":"u1","lastPlayed":1700000000000}"#).unwrap();
        let played = record.last_played.unwrap();
        assert_eq!(played.timestamp(), 1_700_000_000);
    }
}
