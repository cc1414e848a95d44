//! Progress reconciliation.
//!
//! [`ProgressReconciler`] is the only code path that produces a new
//! [`UserStatsSnapshot`] from an old one. The rules:
//! - hearts are replaced by the session's remaining hearts, never accumulated
//! - XP, diamonds and every counter accumulate
//! - every level crossed pays its rewards, multi-level jumps included
//! - the streak moves by local calendar day, not by elapsed hours
//!
//! Reconciliation is infallible. Inputs are sanitized first and a usable
//! snapshot always comes out.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

use crate::curve::{LevelProgress, XpCurve};
use crate::rewards::{LevelRewards, rewards_for_range};
use crate::session::{GameResults, SessionResult};
use crate::snapshot::{StatsRecord, UserStatsSnapshot};

/// How a session moved the daily streak.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StreakChange {
    /// First session ever.
    Started,
    /// Already played today.
    Kept,
    /// Played yesterday, streak grows.
    Continued,
    /// Missed at least one calendar day.
    Reset,
}

/// Result of applying one session.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconcileOutcome {
    pub snapshot: UserStatsSnapshot,
    pub previous_level: u32,
    pub new_level: u32,
    pub leveled_up: bool,
    /// Rewards summed over every level crossed by this session.
    pub rewards: LevelRewards,
    pub progress: LevelProgress,
    pub streak: StreakChange,
}

/// Folds sessions and remote records into snapshots.
///
/// Calendar days are evaluated in `Tz`, the device's local zone by default.
#[derive(Clone, Debug)]
pub struct ProgressReconciler<Tz: TimeZone = Local> {
    curve: XpCurve,
    zone: Tz,
}

impl ProgressReconciler<Local> {
    pub fn new(curve: XpCurve) -> Self {
        Self::with_time_zone(curve, Local)
    }
}

impl Default for ProgressReconciler<Local> {
    fn default() -> Self {
        Self::new(XpCurve::default())
    }
}

impl<Tz: TimeZone> ProgressReconciler<Tz> {
    pub fn with_time_zone(curve: XpCurve, zone: Tz) -> Self {
        Self { curve, zone }
    }

    pub fn curve(&self) -> &XpCurve {
        &self.curve
    }

    /// Apply a finished session to `current` and return the next snapshot.
    pub fn apply_game_session(
        &self,
        current: &UserStatsSnapshot,
        session: &SessionResult,
        now: DateTime<Utc>,
    ) -> ReconcileOutcome {
        let delta = session.sanitize(current);
        let mut next = current.clone();

        next.diamonds = next.diamonds.saturating_add(delta.diamonds_earned);
        next.total_sessions = next.total_sessions.saturating_add(1);
        next.total_correct_answers = next
            .total_correct_answers
            .saturating_add(delta.correct_answers);
        next.total_wrong_answers = next.total_wrong_answers.saturating_add(delta.wrong_answers);
        next.total_time_spent = next.total_time_spent.saturating_add(delta.time_spent);
        next.hearts = delta.hearts_remaining;

        let answered = next
            .total_correct_answers
            .saturating_add(next.total_wrong_answers);
        if answered > 0 {
            let ratio = next.total_correct_answers as f64 / answered as f64;
            next.accuracy = (ratio * 100.0).round().clamp(0.0, 100.0) as u8;
        }

        let previous_level = current.level();
        let new_xp = current.xp().saturating_add(delta.xp_earned);
        let progress = self.curve.progress(new_xp, previous_level);
        next.set_xp(new_xp, &self.curve);

        let new_level = next.level();
        let leveled_up = new_level > previous_level;
        let rewards = rewards_for_range(previous_level, new_level);
        if leveled_up {
            next.hearts = next.hearts.saturating_add(rewards.hearts);
            next.max_hearts = next.max_hearts.saturating_add(rewards.hearts);
            next.diamonds = next.diamonds.saturating_add(rewards.diamonds);
        }

        let (streak, change) = self.next_streak(current.streak, current.last_played, now);
        next.streak = streak;
        next.max_streak = next.max_streak.max(streak);

        next.last_played = Some(now);
        next.last_game_results = Some(GameResults {
            session: delta,
            leveled_up,
            played_at: now,
        });

        ReconcileOutcome {
            snapshot: next,
            previous_level,
            new_level,
            leveled_up,
            rewards,
            progress,
            streak: change,
        }
    }

    /// Merge a fetched server record into the local snapshot.
    ///
    /// While local writes are still queued the local snapshot wins: those
    /// writes replace the server document once they drain. Otherwise the
    /// server record is adopted, field by field, with gaps filled from local.
    /// A record for a different user is ignored.
    pub fn merge_remote(
        &self,
        local: &UserStatsSnapshot,
        remote: StatsRecord,
        has_pending_writes: bool,
    ) -> UserStatsSnapshot {
        if has_pending_writes {
            return local.clone();
        }
        if !remote.user_id.is_empty() && remote.user_id != local.user_id {
            return local.clone();
        }
        UserStatsSnapshot::from_record(remote, Some(local), &self.curve)
    }

    /// Build a snapshot from a cached record, with new-user defaults for gaps.
    pub fn restore(&self, record: StatsRecord) -> UserStatsSnapshot {
        UserStatsSnapshot::from_record(record, None, &self.curve)
    }

    fn calendar_day(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.zone).date_naive()
    }

    fn next_streak(
        &self,
        streak: u32,
        last_played: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> (u32, StreakChange) {
        let Some(last_played) = last_played else {
            return (1, StreakChange::Started);
        };

        let today = self.calendar_day(now);
        let last_day = self.calendar_day(last_played);

        // a last-played day ahead of today (clock moved back) counts as today
        if last_day >= today {
            (streak.max(1), StreakChange::Kept)
        } else if today.pred_opt() == Some(last_day) {
            (streak.saturating_add(1), StreakChange::Continued)
        } else {
            (1, StreakChange::Reset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::rewards_for_level;
    use chrono::FixedOffset;

    fn reconciler() -> ProgressReconciler<FixedOffset> {
        // UTC+7, the app's home market
        let zone = FixedOffset::east_opt(7 * 3600).unwrap();
        ProgressReconciler::with_time_zone(XpCurve::default(), zone)
    }

    fn local_time(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, day, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn zero_session() -> SessionResult {
        SessionResult {
            xp_earned: Some(0.0),
            diamonds_earned: Some(0.0),
            correct_answers: Some(0.0),
            wrong_answers: Some(0.0),
            time_spent: Some(0.0),
            ..SessionResult::default()
        }
    }

    #[test]
    fn zero_delta_leaves_progress_untouched() {
        let reconciler = reconciler();
        let mut snapshot = UserStatsSnapshot::new_user("u1");
        snapshot.set_xp(260, reconciler.curve());
        snapshot.diamonds = 40;

        let outcome = reconciler.apply_game_session(&snapshot, &zero_session(), local_time(5, 9, 0));

        assert_eq!(outcome.snapshot.xp(), 260);
        assert_eq!(outcome.snapshot.diamonds, 40);
        assert_eq!(outcome.snapshot.level(), snapshot.level());
        assert!(!outcome.leveled_up);
        assert!(outcome.rewards.is_empty());
        assert_eq!(outcome.snapshot.total_sessions, 1);
    }

    #[test]
    fn exact_requirement_levels_up_with_rewards() {
        let reconciler = reconciler();
        let snapshot = UserStatsSnapshot::new_user("u1");
        let requirement = reconciler.curve().requirement_for_level(1);

        let outcome = reconciler.apply_game_session(
            &snapshot,
            &SessionResult::with_xp(requirement as f64),
            local_time(5, 9, 0),
        );

        assert!(outcome.leveled_up);
        assert_eq!(outcome.new_level, 2);
        assert_eq!(outcome.snapshot.level(), 2);
        assert_eq!(
            outcome.snapshot.hearts,
            snapshot.hearts + rewards_for_level(2).hearts
        );
        assert_eq!(outcome.snapshot.diamonds, rewards_for_level(2).diamonds);
        assert_eq!(
            outcome.snapshot.max_hearts,
            snapshot.max_hearts + rewards_for_level(2).hearts
        );
        assert_eq!(outcome.progress.within_clamped, 0);
    }

    #[test]
    fn multi_level_jump_pays_every_level() {
        let reconciler = reconciler();
        let snapshot = UserStatsSnapshot::new_user("u1");
        // floor of level 4
        let xp = reconciler.curve().total_xp_before_level(4);

        let outcome = reconciler.apply_game_session(
            &snapshot,
            &SessionResult {
                xp_earned: Some(xp as f64),
                diamonds_earned: Some(10.0),
                ..SessionResult::default()
            },
            local_time(5, 9, 0),
        );

        let expected = rewards_for_level(2) + rewards_for_level(3) + rewards_for_level(4);
        assert_eq!(outcome.new_level, 4);
        assert_eq!(outcome.rewards, expected);
        assert_eq!(outcome.snapshot.diamonds, 10 + expected.diamonds);
        assert_eq!(outcome.snapshot.hearts, 5 + expected.hearts);
    }

    #[test]
    fn hearts_are_replaced_not_accumulated() {
        let reconciler = reconciler();
        let mut snapshot = UserStatsSnapshot::new_user("u1");
        snapshot.hearts = 5;

        let outcome = reconciler.apply_game_session(
            &snapshot,
            &SessionResult {
                hearts_remaining: Some(2.0),
                ..SessionResult::default()
            },
            local_time(5, 9, 0),
        );
        assert_eq!(outcome.snapshot.hearts, 2);

        let untouched = reconciler.apply_game_session(
            &outcome.snapshot,
            &SessionResult::with_xp(5.0),
            local_time(5, 10, 0),
        );
        assert_eq!(untouched.snapshot.hearts, 2);
    }

    #[test]
    fn accuracy_is_recomputed_from_totals() {
        let reconciler = reconciler();
        let mut snapshot = UserStatsSnapshot::new_user("u1");
        snapshot.total_correct_answers = 6;
        snapshot.total_wrong_answers = 2;
        snapshot.accuracy = 75;

        let outcome = reconciler.apply_game_session(
            &snapshot,
            &SessionResult {
                correct_answers: Some(3.0),
                wrong_answers: Some(1.0),
                accuracy: Some(75.0),
                ..SessionResult::default()
            },
            local_time(5, 9, 0),
        );
        // 9 / 12
        assert_eq!(outcome.snapshot.accuracy, 75);
        assert_eq!(outcome.snapshot.total_correct_answers, 9);

        let no_answers =
            reconciler.apply_game_session(&UserStatsSnapshot::new_user("u2"), &zero_session(), local_time(5, 9, 0));
        assert_eq!(no_answers.snapshot.accuracy, 0);
    }

    #[test]
    fn streak_follows_calendar_days() {
        let reconciler = reconciler();
        let mut snapshot = UserStatsSnapshot::new_user("u1");
        snapshot.streak = 3;
        snapshot.max_streak = 3;

        // yesterday 23:59 → today 00:01 is a new day despite two minutes elapsed
        snapshot.last_played = Some(local_time(4, 23, 59));
        let outcome = reconciler.apply_game_session(&snapshot, &zero_session(), local_time(5, 0, 1));
        assert_eq!(outcome.streak, StreakChange::Continued);
        assert_eq!(outcome.snapshot.streak, 4);
        assert_eq!(outcome.snapshot.max_streak, 4);

        // same day
        snapshot.last_played = Some(local_time(5, 0, 30));
        let outcome = reconciler.apply_game_session(&snapshot, &zero_session(), local_time(5, 23, 0));
        assert_eq!(outcome.streak, StreakChange::Kept);
        assert_eq!(outcome.snapshot.streak, 3);

        // two days ago
        snapshot.last_played = Some(local_time(3, 12, 0));
        let outcome = reconciler.apply_game_session(&snapshot, &zero_session(), local_time(5, 12, 0));
        assert_eq!(outcome.streak, StreakChange::Reset);
        assert_eq!(outcome.snapshot.streak, 1);
        assert_eq!(outcome.snapshot.max_streak, 3);
    }

    #[test]
    fn streak_uses_local_day_not_utc_day() {
        let reconciler = reconciler();
        let mut snapshot = UserStatsSnapshot::new_user("u1");
        snapshot.streak = 2;
        snapshot.max_streak = 2;
        // 06:00 and 08:00 local are the same local day but straddle midnight UTC
        snapshot.last_played = Some(local_time(5, 6, 0));
        let now = local_time(5, 8, 0);
        assert_ne!(
            snapshot.last_played.unwrap().date_naive(),
            now.date_naive()
        );

        let outcome = reconciler.apply_game_session(&snapshot, &zero_session(), now);
        assert_eq!(outcome.streak, StreakChange::Kept);
        assert_eq!(outcome.snapshot.streak, 2);
    }

    #[test]
    fn first_session_starts_streak() {
        let reconciler = reconciler();
        let outcome = reconciler.apply_game_session(
            &UserStatsSnapshot::new_user("u1"),
            &zero_session(),
            local_time(5, 9, 0),
        );
        assert_eq!(outcome.streak, StreakChange::Started);
        assert_eq!(outcome.snapshot.streak, 1);
        assert_eq!(outcome.snapshot.max_streak, 1);
        assert_eq!(outcome.snapshot.last_played, Some(local_time(5, 9, 0)));
        assert!(outcome.snapshot.last_game_results.is_some());
    }

    #[test]
    fn clock_moved_back_keeps_streak() {
        let reconciler = reconciler();
        let mut snapshot = UserStatsSnapshot::new_user("u1");
        snapshot.streak = 5;
        snapshot.max_streak = 5;
        snapshot.last_played = Some(local_time(9, 9, 0));

        let outcome = reconciler.apply_game_session(&snapshot, &zero_session(), local_time(5, 9, 0));
        assert_eq!(outcome.streak, StreakChange::Kept);
        assert_eq!(outcome.snapshot.streak, 5);
    }

    #[test]
    fn merge_prefers_local_while_writes_are_pending() {
        let reconciler = reconciler();
        let mut local = UserStatsSnapshot::new_user("u1");
        local.set_xp(500, reconciler.curve());

        let remote = StatsRecord {
            xp: Some(20),
            ..StatsRecord::empty("u1")
        };

        let merged = reconciler.merge_remote(&local, remote.clone(), true);
        assert_eq!(merged.xp(), 500);

        let merged = reconciler.merge_remote(&local, remote, false);
        assert_eq!(merged.xp(), 20);
        assert_eq!(merged.level(), 1);
    }

    #[test]
    fn merge_ignores_foreign_records() {
        let reconciler = reconciler();
        let local = UserStatsSnapshot::new_user("u1");
        let remote = StatsRecord {
            xp: Some(900),
            ..StatsRecord::empty("someone-else")
        };
        assert_eq!(reconciler.merge_remote(&local, remote, false), local);
    }
}
