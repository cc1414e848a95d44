use crate::error::CurveConfigError;

/// XP curve constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct XpCurveConfig {
    /// XP needed to clear level 1, and the floor for every later level.
    pub base_requirement: u64,
    /// Geometric growth factor applied per level.
    pub growth_rate: f64,
    /// Requirements are rounded to a multiple of this step.
    pub rounding_step: u64,
}

impl XpCurveConfig {
    // ===== defaults shipped with the app =====
    pub const DEFAULT_BASE_REQUIREMENT: u64 = 100;
    pub const DEFAULT_GROWTH_RATE: f64 = 1.15;
    pub const DEFAULT_ROUNDING_STEP: u64 = 5;

    pub const fn new(base_requirement: u64, growth_rate: f64, rounding_step: u64) -> Self {
        Self {
            base_requirement,
            growth_rate,
            rounding_step,
        }
    }

    /// Check `base_requirement > 0`, `growth_rate > 1` and `rounding_step > 0`.
    pub fn validate(&self) -> Result<(), CurveConfigError> {
        if self.base_requirement == 0 {
            return Err(CurveConfigError::ZeroBaseRequirement);
        }
        if !self.growth_rate.is_finite() || self.growth_rate <= 1.0 {
            return Err(CurveConfigError::InvalidGrowthRate(self.growth_rate));
        }
        if self.rounding_step == 0 {
            return Err(CurveConfigError::ZeroRoundingStep);
        }
        Ok(())
    }
}

impl Default for XpCurveConfig {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_BASE_REQUIREMENT,
            Self::DEFAULT_GROWTH_RATE,
            Self::DEFAULT_ROUNDING_STEP,
        )
    }
}
