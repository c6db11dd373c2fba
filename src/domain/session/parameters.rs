use crate::domain::errors::ParameterError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Declared parameters of a trading session.
///
/// Immutable once the session starts driving the planner: changing any field
/// invalidates the required-balance table built from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionParameters {
    /// Starting balance
    pub capital: Decimal,
    /// Planned number of trades
    pub total_trades: u32,
    /// Target win-rate percentage in [0, 100]
    pub accuracy: Decimal,
    /// A win pays `risk_reward_ratio` times the stake, a loss forfeits the stake
    pub risk_reward_ratio: Decimal,
}

impl SessionParameters {
    pub fn new(
        capital: Decimal,
        total_trades: u32,
        accuracy: Decimal,
        risk_reward_ratio: Decimal,
    ) -> Self {
        Self {
            capital,
            total_trades,
            accuracy,
            risk_reward_ratio,
        }
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.capital <= Decimal::ZERO {
            return Err(ParameterError::NonPositiveCapital(self.capital));
        }
        if self.total_trades == 0 {
            return Err(ParameterError::NoTrades);
        }
        if self.accuracy < Decimal::ZERO || self.accuracy > dec!(100) {
            return Err(ParameterError::AccuracyOutOfRange(self.accuracy));
        }
        if self.risk_reward_ratio <= Decimal::ZERO {
            return Err(ParameterError::NonPositiveRiskReward(self.risk_reward_ratio));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Wins needed out of all planned trades: `ceil(total_trades * accuracy / 100)`,
    /// clamped to `[0, total_trades]`.
    pub fn required_wins(&self) -> u32 {
        if self.total_trades == 0 || self.accuracy <= Decimal::ZERO {
            return 0;
        }
        let wins = (Decimal::from(self.total_trades) * self.accuracy / dec!(100)).ceil();
        wins.to_u32()
            .unwrap_or(self.total_trades)
            .min(self.total_trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(total_trades: u32, accuracy: Decimal) -> SessionParameters {
        SessionParameters::new(dec!(1000), total_trades, accuracy, dec!(3))
    }

    #[test]
    fn test_required_wins_rounds_up() {
        assert_eq!(params(10, dec!(50)).required_wins(), 5);
        assert_eq!(params(10, dec!(51)).required_wins(), 6);
        assert_eq!(params(7, dec!(33.3)).required_wins(), 3);
    }

    #[test]
    fn test_required_wins_clamped() {
        assert_eq!(params(10, Decimal::ZERO).required_wins(), 0);
        assert_eq!(params(10, dec!(100)).required_wins(), 10);
        // Out-of-range accuracy still clamps rather than overflowing the plan
        assert_eq!(params(10, dec!(250)).required_wins(), 10);
        assert_eq!(params(10, dec!(-5)).required_wins(), 0);
        assert_eq!(params(0, dec!(50)).required_wins(), 0);
    }

    #[test]
    fn test_validation() {
        assert!(params(10, dec!(50)).is_valid());
        assert_eq!(
            SessionParameters::new(Decimal::ZERO, 10, dec!(50), dec!(3)).validate(),
            Err(ParameterError::NonPositiveCapital(Decimal::ZERO))
        );
        assert_eq!(params(0, dec!(50)).validate(), Err(ParameterError::NoTrades));
        assert_eq!(
            params(10, dec!(100.5)).validate(),
            Err(ParameterError::AccuracyOutOfRange(dec!(100.5)))
        );
        assert_eq!(
            SessionParameters::new(dec!(1000), 10, dec!(50), dec!(-1)).validate(),
            Err(ParameterError::NonPositiveRiskReward(dec!(-1)))
        );
    }
}
