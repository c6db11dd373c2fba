use crate::domain::errors::PlanningError;
use crate::domain::planning::round_cents;
use crate::domain::session::trade::{Trade, TradeOutcome};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Realized result of a resolved trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedResult {
    pub profit_or_loss: Decimal,
    pub profit_or_loss_percentage: Decimal,
}

/// Applies win/loss verdicts to pending trades.
pub struct OutcomeRecorder;

impl OutcomeRecorder {
    /// Profit/loss of a stake for the given outcome.
    ///
    /// A win pays `stake·R` (`R·100` percent), a loss forfeits the stake (−100 percent).
    pub fn evaluate(
        stake: Decimal,
        risk_reward_ratio: Decimal,
        outcome: TradeOutcome,
    ) -> Result<RealizedResult, PlanningError> {
        match outcome {
            TradeOutcome::Won => {
                let profit = stake
                    .checked_mul(risk_reward_ratio)
                    .ok_or(PlanningError::AmountOverflow("win profit"))?;
                let percentage = risk_reward_ratio
                    .checked_mul(dec!(100))
                    .ok_or(PlanningError::AmountOverflow("win percentage"))?;
                Ok(RealizedResult {
                    profit_or_loss: round_cents(profit),
                    profit_or_loss_percentage: round_cents(percentage),
                })
            }
            TradeOutcome::Lost => Ok(RealizedResult {
                profit_or_loss: -stake,
                profit_or_loss_percentage: dec!(-100),
            }),
        }
    }

    /// Resolve a pending trade. A trade's outcome can be recorded exactly once;
    /// any further attempt, or a profit that overflows, fails without touching
    /// the trade.
    pub fn record(
        trade: &mut Trade,
        risk_reward_ratio: Decimal,
        outcome: TradeOutcome,
    ) -> Result<RealizedResult, PlanningError> {
        if !trade.is_pending() {
            return Err(PlanningError::TradeNotPending {
                trade_id: trade.id,
                status: trade.status,
            });
        }

        let result = Self::evaluate(trade.investment, risk_reward_ratio, outcome)?;
        trade.profit_or_loss = result.profit_or_loss;
        trade.profit_or_loss_percentage = result.profit_or_loss_percentage;
        trade.status = outcome.into();
        trade.resolved_at = Some(Utc::now());

        info!(
            "OutcomeRecorder: Trade #{} ({}) {} with stake ${}: P&L ${} ({}%)",
            trade.sequence,
            trade.id,
            outcome,
            trade.investment,
            result.profit_or_loss,
            result.profit_or_loss_percentage
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::trade::TradeStatus;
    use uuid::Uuid;

    #[test]
    fn test_evaluate_win_and_loss() {
        let won = OutcomeRecorder::evaluate(dec!(100), dec!(3), TradeOutcome::Won).unwrap();
        assert_eq!(won.profit_or_loss, dec!(300));
        assert_eq!(won.profit_or_loss_percentage, dec!(300));

        let lost = OutcomeRecorder::evaluate(dec!(100), dec!(3), TradeOutcome::Lost).unwrap();
        assert_eq!(lost.profit_or_loss, dec!(-100));
        assert_eq!(lost.profit_or_loss_percentage, dec!(-100));
    }

    #[test]
    fn test_win_profit_rounded_to_cents() {
        let won = OutcomeRecorder::evaluate(dec!(33.33), dec!(1.5), TradeOutcome::Won).unwrap();
        // 49.995 rounds half-up
        assert_eq!(won.profit_or_loss, dec!(50.00));
        assert_eq!(won.profit_or_loss_percentage, dec!(150));
    }

    #[test]
    fn test_record_resolves_pending_trade() {
        let mut trade = Trade::pending(Uuid::new_v4(), 1, dec!(250));
        let result = OutcomeRecorder::record(&mut trade, dec!(2), TradeOutcome::Won).unwrap();

        assert_eq!(result.profit_or_loss, dec!(500));
        assert_eq!(trade.status, TradeStatus::Won);
        assert_eq!(trade.profit_or_loss, dec!(500));
        assert!(trade.resolved_at.is_some());
    }

    #[test]
    fn test_record_twice_is_rejected_without_mutation() {
        let mut trade = Trade::pending(Uuid::new_v4(), 1, dec!(250));
        OutcomeRecorder::record(&mut trade, dec!(2), TradeOutcome::Lost).unwrap();
        let snapshot = trade.clone();

        let err = OutcomeRecorder::record(&mut trade, dec!(2), TradeOutcome::Won).unwrap_err();
        assert_eq!(
            err,
            PlanningError::TradeNotPending {
                trade_id: trade.id,
                status: TradeStatus::Lost,
            }
        );
        assert_eq!(trade, snapshot);
    }

    #[test]
    fn test_overflowing_win_leaves_trade_pending() {
        let mut trade = Trade::pending(Uuid::new_v4(), 1, Decimal::MAX / dec!(2));
        let snapshot = trade.clone();

        let err = OutcomeRecorder::record(&mut trade, dec!(3), TradeOutcome::Won).unwrap_err();
        assert_eq!(err, PlanningError::AmountOverflow("win profit"));
        assert_eq!(trade, snapshot);

        // The same stake can still be lost
        let lost = OutcomeRecorder::record(&mut trade, dec!(3), TradeOutcome::Lost).unwrap();
        assert_eq!(lost.profit_or_loss, -(Decimal::MAX / dec!(2)));
    }
}
