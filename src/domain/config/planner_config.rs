//! Planner Configuration Domain Value Object
//!
//! This module defines the `PlannerConfig` value object, which carries the
//! business constants of the stake planning engine with validation logic.
//!
//! # Design Principles
//!
//! - **Auditability**: The benchmark win rate and base risk fraction are named
//!   constants instead of literals buried in the target profit formula
//! - **Self-Validation**: The `validate()` method ensures invariants are maintained

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Benchmark win rate used for the aspirational target (60%).
///
/// Deliberately independent of a session's own accuracy.
pub const BENCHMARK_WIN_RATE: Decimal = dec!(0.60);

/// Fraction of the balance notionally risked per trade when compounding the target (6%).
pub const BASE_RISK_FRACTION: Decimal = dec!(0.06);

/// Realized profit within this distance of the target counts as reconciled.
pub const ALIGNMENT_TOLERANCE: Decimal = dec!(0.01);

/// Total number of passes the profit aligner may spend on one trade.
pub const ALIGNMENT_MAX_PASSES: usize = 3;

/// Error type for PlannerConfig validation
#[derive(Debug, Error, PartialEq)]
pub enum PlannerConfigError {
    #[error("Invalid fraction: {field} = {value}. Must be strictly between 0 and 1")]
    InvalidFraction { field: String, value: Decimal },

    #[error("Invalid tolerance: {value}. Must be positive")]
    InvalidTolerance { value: Decimal },

    #[error("Invalid limit: {field} = {value}. Must be positive")]
    InvalidLimit { field: String, value: usize },
}

/// Stake planner configuration value object
///
/// # Invariants
///
/// - `benchmark_win_rate` and `base_risk_fraction` lie in (0, 1)
/// - `alignment_tolerance` > 0
/// - `alignment_max_passes` > 0
///
/// # Example
///
/// ```rust
/// use rust_decimal_macros::dec;
/// use stakeplan::domain::config::PlannerConfig;
///
/// let config = PlannerConfig::new(dec!(0.55), dec!(0.05), dec!(0.01), 3)
///     .expect("Valid config");
/// assert_eq!(config.benchmark_win_rate, dec!(0.55));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Win rate assumed when compounding the target profit (e.g., 0.60 = 60%)
    pub benchmark_win_rate: Decimal,

    /// Balance fraction risked per benchmark trade (e.g., 0.06 = 6%)
    pub base_risk_fraction: Decimal,

    /// Residual below which profit alignment is a no-op / success
    pub alignment_tolerance: Decimal,

    /// Passes the aligner may spend before reporting a residual
    pub alignment_max_passes: usize,
}

impl PlannerConfig {
    /// Create a new PlannerConfig with validation
    ///
    /// # Errors
    ///
    /// Returns `PlannerConfigError` if any parameter violates invariants
    pub fn new(
        benchmark_win_rate: Decimal,
        base_risk_fraction: Decimal,
        alignment_tolerance: Decimal,
        alignment_max_passes: usize,
    ) -> Result<Self, PlannerConfigError> {
        let config = Self {
            benchmark_win_rate,
            base_risk_fraction,
            alignment_tolerance,
            alignment_max_passes,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate all invariants
    pub fn validate(&self) -> Result<(), PlannerConfigError> {
        Self::validate_fraction("benchmark_win_rate", self.benchmark_win_rate)?;
        Self::validate_fraction("base_risk_fraction", self.base_risk_fraction)?;

        if self.alignment_tolerance <= Decimal::ZERO {
            return Err(PlannerConfigError::InvalidTolerance {
                value: self.alignment_tolerance,
            });
        }

        if self.alignment_max_passes == 0 {
            return Err(PlannerConfigError::InvalidLimit {
                field: "alignment_max_passes".to_string(),
                value: self.alignment_max_passes,
            });
        }

        Ok(())
    }

    fn validate_fraction(field: &str, value: Decimal) -> Result<(), PlannerConfigError> {
        if value <= Decimal::ZERO || value >= Decimal::ONE {
            return Err(PlannerConfigError::InvalidFraction {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            benchmark_win_rate: BENCHMARK_WIN_RATE,
            base_risk_fraction: BASE_RISK_FRACTION,
            alignment_tolerance: ALIGNMENT_TOLERANCE,
            alignment_max_passes: ALIGNMENT_MAX_PASSES,
        }
    }
}
