//! Level-up reward table.
//!
//! Formulas:
//! - hearts = 1 + ⌊(L-1) / 2⌋
//! - diamonds = 8 + (L-1) × 5

use core::ops::{Add, AddAssign};

/// Rewards granted on reaching a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelRewards {
    pub hearts: u32,
    pub diamonds: u64,
}

impl LevelRewards {
    pub const NONE: Self = Self {
        hearts: 0,
        diamonds: 0,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

impl Add for LevelRewards {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            hearts: self.hearts.saturating_add(rhs.hearts),
            diamonds: self.diamonds.saturating_add(rhs.diamonds),
        }
    }
}

impl AddAssign for LevelRewards {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Rewards for reaching `level`. Level 0 is treated as level 1.
pub fn rewards_for_level(level: u32) -> LevelRewards {
    let steps = level.max(1) - 1;
    LevelRewards {
        hearts: 1 + steps / 2,
        diamonds: 8 + u64::from(steps) * 5,
    }
}

/// Sum of the rewards for every level in `(from, to]`.
///
/// A session that jumps several levels at once earns each crossed level's
/// rewards. Empty when `to <= from`.
pub fn rewards_for_range(from: u32, to: u32) -> LevelRewards {
    (from.saturating_add(1)..=to)
        .map(rewards_for_level)
        .fold(LevelRewards::NONE, Add::add)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_values() {
        assert_eq!(
            rewards_for_level(1),
            LevelRewards {
                hearts: 1,
                diamonds: 8
            }
        );
        assert_eq!(
            rewards_for_level(2),
            LevelRewards {
                hearts: 1,
                diamonds: 13
            }
        );
        assert_eq!(
            rewards_for_level(3),
            LevelRewards {
                hearts: 2,
                diamonds: 18
            }
        );
        assert_eq!(
            rewards_for_level(10),
            LevelRewards {
                hearts: 5,
                diamonds: 53
            }
        );
    }

    #[test]
    fn range_sums_each_crossed_level() {
        assert!(rewards_for_range(3, 3).is_empty());
        assert!(rewards_for_range(4, 2).is_empty());
        assert_eq!(rewards_for_range(1, 2), rewards_for_level(2));
        assert_eq!(
            rewards_for_range(1, 4),
            rewards_for_level(2) + rewards_for_level(3) + rewards_for_level(4)
        );
    }
}
