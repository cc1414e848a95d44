//! Error types for progress-core.
//!
//! Reconciliation never fails: malformed session input is coerced, not
//! rejected. The only fallible surface is curve configuration, which is
//! validated once when an [`XpCurve`](crate::XpCurve) is built.

use thiserror::Error;

/// Violations of the [`XpCurveConfig`](crate::XpCurveConfig) invariants.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CurveConfigError {
    #[error("base requirement must be greater than zero")]
    ZeroBaseRequirement,

    #[error("growth rate must be a finite number greater than 1, got {0}")]
    InvalidGrowthRate(f64),

    #[error("rounding step must be greater than zero")]
    ZeroRoundingStep,
}
