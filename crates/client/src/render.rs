//! Plain-terminal rendering of snapshots, outcomes and sync events.
use std::fmt::Write;

use console::style;
use progress_core::{LevelProgress, ReconcileOutcome, StreakChange, UserStatsSnapshot};
use progress_sync::{Connectivity, SyncEvent, SyncReport, SyncStatus};

const BAR_WIDTH: usize = 20;

fn bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn connectivity(connectivity: Connectivity) -> String {
    match connectivity {
        Connectivity::Online => style("online").green().to_string(),
        Connectivity::Offline => style("offline").yellow().to_string(),
        Connectivity::Unknown => style("unknown").dim().to_string(),
    }
}

pub fn status(snapshot: &UserStatsSnapshot, progress: &LevelProgress, sync: &SyncStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style(&snapshot.user_id).bold());
    let _ = writeln!(
        out,
        "  Level {}  {} {}%  ({} XP to next)",
        style(snapshot.level()).cyan().bold(),
        bar(progress.percent),
        progress.percent,
        progress.to_next
    );
    let _ = writeln!(out, "  XP        {}", snapshot.xp());
    let _ = writeln!(out, "  Diamonds  {}", snapshot.diamonds);
    let _ = writeln!(out, "  Hearts    {}/{}", snapshot.hearts, snapshot.max_hearts);
    let _ = writeln!(
        out,
        "  Streak    {} (best {})",
        snapshot.streak, snapshot.max_streak
    );
    let _ = writeln!(
        out,
        "  Accuracy  {}% over {} sessions",
        snapshot.accuracy, snapshot.total_sessions
    );
    if let Some(last) = snapshot.last_played {
        let _ = writeln!(out, "  Last      {}", last.format("%Y-%m-%d %H:%M UTC"));
    }
    let _ = write!(
        out,
        "  Sync      {}, {} pending",
        connectivity(sync.connectivity),
        sync.pending_writes
    );
    if let Some(at) = sync.last_synced_at {
        let _ = write!(out, ", last synced {}", at.format("%H:%M:%S UTC"));
    }
    out
}

pub fn outcome(outcome: &ReconcileOutcome) -> String {
    let mut out = String::new();
    let snapshot = &outcome.snapshot;
    let earned = snapshot
        .last_game_results
        .as_ref()
        .map(|results| results.session.xp_earned)
        .unwrap_or_default();

    let _ = writeln!(
        out,
        "{} +{} XP, now {} XP",
        style("✓").green(),
        earned,
        snapshot.xp()
    );
    if outcome.leveled_up {
        let _ = writeln!(
            out,
            "{} Level {} → {}  (+{} hearts, +{} diamonds)",
            style("★").yellow().bold(),
            outcome.previous_level,
            outcome.new_level,
            outcome.rewards.hearts,
            outcome.rewards.diamonds
        );
    }
    let streak = match outcome.streak {
        StreakChange::Started => "streak started",
        StreakChange::Kept => "streak kept",
        StreakChange::Continued => "streak continued",
        StreakChange::Reset => "streak reset",
    };
    let _ = write!(
        out,
        "  {} ({} days), {}% to level {}",
        streak,
        snapshot.streak,
        outcome.progress.percent,
        outcome.new_level.saturating_add(1)
    );
    out
}

pub fn report(report: &SyncReport) -> String {
    let mut out = format!(
        "{} pushed {}, {} pending",
        connectivity(report.connectivity),
        report.drained,
        report.remaining
    );
    if report.fetched {
        out.push_str(", refreshed from server");
    }
    if report.seeded {
        out.push_str(", uploaded local stats to a new server record");
    }
    out
}

pub fn event(event: &SyncEvent) -> String {
    match event {
        SyncEvent::LevelUp {
            previous_level,
            new_level,
            rewards,
            ..
        } => format!(
            "level up {} → {} (+{} hearts, +{} diamonds)",
            previous_level, new_level, rewards.hearts, rewards.diamonds
        ),
        SyncEvent::WriteQueued { pending, .. } => format!("write queued ({pending} pending)"),
        SyncEvent::WritePushed { .. } => "write pushed".to_owned(),
        SyncEvent::QueueDrained {
            drained, remaining, ..
        } => format!("queue drained: {drained} pushed, {remaining} left"),
        SyncEvent::Refreshed { xp, level, .. } => {
            format!("refreshed from server: level {level}, {xp} XP")
        }
        SyncEvent::ConnectivityChanged { connectivity: to } => {
            format!("connectivity: {}", connectivity(*to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use progress_core::{ProgressReconciler, SessionResult, XpCurve};

    fn plain(text: String) -> String {
        console::strip_ansi_codes(&text).into_owned()
    }

    #[test]
    fn bar_is_proportional() {
        assert_eq!(bar(0), format!("[{}]", "-".repeat(20)));
        assert_eq!(bar(50), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
        assert_eq!(bar(100), format!("[{}]", "#".repeat(20)));
    }

    #[test]
    fn status_shows_level_and_pending_writes() {
        let curve = XpCurve::default();
        let mut snapshot = UserStatsSnapshot::new_user("learner-1");
        snapshot.set_xp(146, &curve);
        let progress = snapshot.progress(&curve);
        let sync = SyncStatus {
            connectivity: Connectivity::Offline,
            pending_writes: 2,
            ..SyncStatus::default()
        };

        let text = plain(status(&snapshot, &progress, &sync));
        assert!(text.contains("Level 2"));
        assert!(text.contains("40%"));
        assert!(text.contains("69 XP to next"));
        assert!(text.contains("offline, 2 pending"));
    }

    #[test]
    fn outcome_announces_level_up() {
        let reconciler = ProgressReconciler::default();
        let current = UserStatsSnapshot::new_user("learner-1");
        let result =
            reconciler.apply_game_session(&current, &SessionResult::with_xp(100.0), Utc::now());

        let text = plain(outcome(&result));
        assert!(text.contains("+100 XP"));
        assert!(text.contains("Level 1 → 2"));
        assert!(text.contains("streak started"));
    }

    #[test]
    fn report_mentions_refresh() {
        let report = SyncReport {
            connectivity: Connectivity::Online,
            drained: 3,
            remaining: 0,
            fetched: true,
            seeded: false,
        };
        assert_eq!(
            plain(super::report(&report)),
            "online pushed 3, 0 pending, refreshed from server"
        );
    }

    #[test]
    fn report_mentions_seeded_server_record() {
        let report = SyncReport {
            connectivity: Connectivity::Online,
            drained: 1,
            remaining: 0,
            fetched: false,
            seeded: true,
        };
        assert_eq!(
            plain(super::report(&report)),
            "online pushed 1, 0 pending, uploaded local stats to a new server record"
        );
    }
}
