//! Geometric XP curve.
//!
//! Only the cumulative XP total is stored; level and in-level progress are
//! always projected from it through this module. Formulas:
//! - requirement(L) = round(base × growth^(L-1) / step) × step, floored at base
//! - before(L) = Σ requirement(i) for i in [1, L-1]

use crate::config::XpCurveConfig;
use crate::error::CurveConfigError;
use crate::sanitize;

/// Validated, immutable XP curve.
#[derive(Clone, Debug, PartialEq)]
pub struct XpCurve {
    config: XpCurveConfig,
}

/// Level bracket containing a given XP total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelResolution {
    pub level: u32,
    /// XP accumulated by all levels below `level`.
    pub accumulated_before: u64,
}

/// In-level progress derived from an XP total. Never persisted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LevelProgress {
    pub level: u32,
    /// XP needed to clear `level`.
    pub requirement: u64,
    pub accumulated_before: u64,
    /// XP earned inside the current level, within `[0, requirement]`.
    pub within_clamped: u64,
    /// `within_clamped / requirement`, within `[0, 1]`.
    pub ratio: f64,
    /// `ratio` as a rounded percentage.
    pub percent: u8,
    pub to_next: u64,
}

impl XpCurve {
    /// Build a curve, rejecting configurations that break monotonicity.
    pub fn new(config: XpCurveConfig) -> Result<Self, CurveConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &XpCurveConfig {
        &self.config
    }

    /// XP needed to clear `level`. Level 0 is treated as level 1.
    pub fn requirement_for_level(&self, level: u32) -> u64 {
        let exponent = f64::from(level.max(1) - 1);
        let base = self.config.base_requirement as f64;
        let step = self.config.rounding_step as f64;

        let raw = base * self.config.growth_rate.powf(exponent);
        let rounded = (raw / step).round() * step;

        // `as` saturates, so an infinite requirement becomes u64::MAX
        (rounded as u64).max(self.config.base_requirement)
    }

    /// Total XP required to reach the start of `level`. Zero for level ≤ 1.
    pub fn total_xp_before_level(&self, level: u32) -> u64 {
        let mut total: u64 = 0;
        for below in 1..level {
            total = total.saturating_add(self.requirement_for_level(below));
            if total == u64::MAX {
                break;
            }
        }
        total
    }

    /// Find the level bracket containing `total_xp`.
    ///
    /// `hinted_level` is where the walk starts, typically the level cached
    /// alongside the XP. A hint whose floor lies above `total_xp` (XP was
    /// corrected downward, or the hint is simply wrong) triggers a full scan
    /// from level 1, so the result never depends on the hint being right.
    pub fn resolve_level(&self, total_xp: u64, hinted_level: u32) -> LevelResolution {
        let (mut level, mut accumulated) = match self.floor_within(hinted_level.max(1), total_xp) {
            Some(floor) => (hinted_level.max(1), floor),
            None => (1, 0),
        };

        loop {
            let requirement = self.requirement_for_level(level);
            match accumulated.checked_add(requirement) {
                Some(next) if next <= total_xp && level < u32::MAX => {
                    accumulated = next;
                    level += 1;
                }
                _ => break,
            }
        }

        LevelResolution {
            level,
            accumulated_before: accumulated,
        }
    }

    /// `total_xp_before_level(level)`, or `None` as soon as the running sum
    /// passes `cap`. Bounds the work done for an absurd hint.
    fn floor_within(&self, level: u32, cap: u64) -> Option<u64> {
        let mut total: u64 = 0;
        for below in 1..level {
            total = total.checked_add(self.requirement_for_level(below))?;
            if total > cap {
                return None;
            }
        }
        Some(total)
    }

    /// Level reached with `total_xp`.
    pub fn level_for(&self, total_xp: u64) -> u32 {
        self.resolve_level(total_xp, 1).level
    }

    /// Project `total_xp` onto its level and in-level progress.
    pub fn progress(&self, total_xp: u64, hinted_level: u32) -> LevelProgress {
        let LevelResolution {
            level,
            accumulated_before,
        } = self.resolve_level(total_xp, hinted_level);

        let requirement = self.requirement_for_level(level);
        let within_clamped = total_xp
            .saturating_sub(accumulated_before)
            .min(requirement);
        let ratio = (within_clamped as f64 / requirement as f64).clamp(0.0, 1.0);

        LevelProgress {
            level,
            requirement,
            accumulated_before,
            within_clamped,
            ratio,
            percent: (ratio * 100.0).round() as u8,
            to_next: requirement - within_clamped,
        }
    }

    /// [`progress`](Self::progress) for an unchecked number: negative or
    /// non-finite XP is treated as 0.
    pub fn progress_raw(&self, raw_xp: f64, hinted_level: u32) -> LevelProgress {
        self.progress(sanitize::coerce_xp(raw_xp), hinted_level)
    }
}

impl Default for XpCurve {
    fn default() -> Self {
        Self {
            config: XpCurveConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> XpCurve {
        XpCurve::default()
    }

    #[test]
    fn default_requirements() {
        let curve = curve();
        assert_eq!(curve.requirement_for_level(0), 100);
        assert_eq!(curve.requirement_for_level(1), 100);
        // 115
        assert_eq!(curve.requirement_for_level(2), 115);
        // 132.25 → 26.45 steps → 130
        assert_eq!(curve.requirement_for_level(3), 130);
        // 152.0875 → 30.4 steps → 150
        assert_eq!(curve.requirement_for_level(4), 150);
        // 174.9 → 35 steps → 175
        assert_eq!(curve.requirement_for_level(5), 175);
    }

    #[test]
    fn requirements_are_monotonic() {
        let curve = curve();
        for level in 1..400 {
            assert!(
                curve.requirement_for_level(level + 1) >= curve.requirement_for_level(level),
                "requirement dropped after level {level}"
            );
        }
    }

    #[test]
    fn huge_hint_on_a_flat_curve_is_rejected_quickly() {
        let curve = XpCurve::new(XpCurveConfig::new(100, 1.000_000_1, 5)).unwrap();

        let resolution = curve.resolve_level(1_000, u32::MAX);
        assert_eq!(resolution.level, 11);
        assert_eq!(resolution.accumulated_before, 1_000);

        assert_eq!(curve.resolve_level(0, u32::MAX - 1).level, 1);
    }

    #[test]
    fn total_before_level_sums_lower_levels() {
        let curve = curve();
        assert_eq!(curve.total_xp_before_level(0), 0);
        assert_eq!(curve.total_xp_before_level(1), 0);
        assert_eq!(curve.total_xp_before_level(2), 100);
        assert_eq!(curve.total_xp_before_level(3), 215);
        assert_eq!(curve.total_xp_before_level(4), 345);
    }

    #[test]
    fn level_floor_round_trips() {
        let curve = curve();
        for level in 1..200 {
            let floor = curve.total_xp_before_level(level);
            let resolved = curve.resolve_level(floor, 1);
            assert_eq!(resolved.level, level);
            assert_eq!(resolved.accumulated_before, floor);
        }
    }

    #[test]
    fn stale_hint_falls_back_to_full_scan() {
        let curve = curve();
        // 150 XP is level 2 no matter what the cached level claims
        assert_eq!(curve.resolve_level(150, 9).level, 2);
        assert_eq!(curve.resolve_level(150, 0).level, 2);
        assert_eq!(curve.resolve_level(150, 2).level, 2);
        // a hint below the real level walks upward
        assert_eq!(curve.resolve_level(345, 1).level, 4);
    }

    #[test]
    fn absurd_inputs_terminate() {
        let curve = curve();
        let top = curve.resolve_level(u64::MAX, u32::MAX);
        assert!(top.level > 1);
        assert_eq!(curve.resolve_level(u64::MAX, 1), top);
    }

    #[test]
    fn fresh_user_progress() {
        let progress = curve().progress(0, 1);
        assert_eq!(progress.level, 1);
        assert_eq!(progress.requirement, 100);
        assert_eq!(progress.within_clamped, 0);
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.to_next, 100);
    }

    #[test]
    fn exact_boundary_lands_on_next_level() {
        let progress = curve().progress(100, 1);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.within_clamped, 0);
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.to_next, 115);
    }

    #[test]
    fn mid_level_progress() {
        // 100 (level 1) + 46 of 115
        let progress = curve().progress(146, 1);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.within_clamped, 46);
        assert_eq!(progress.percent, 40);
        assert_eq!(progress.to_next, 69);
    }

    #[test]
    fn negative_xp_is_clamped() {
        let progress = curve().progress_raw(-50.0, 3);
        assert_eq!(progress.level, 1);
        assert_eq!(progress.within_clamped, 0);
        assert_eq!(progress.percent, 0);

        let progress = curve().progress_raw(f64::NAN, 1);
        assert_eq!(progress.within_clamped, 0);
    }
}
