//! Profit alignment
//!
//! Cent-level rounding of stakes and profits can leave a session's realized
//! profit slightly off its target. The aligner closes that gap by rewriting a
//! single completed trade, keeping its outcome and, as closely as cent
//! precision allows, its realized profit/investment ratio.
//!
//! # Candidate selection
//!
//! - Profit short of target: the most recent won trade
//! - Profit above target: the most recent lost trade
//! - Otherwise the most recent completed trade
//!
//! "Most recent" follows slice order, which callers keep chronological.
//! Only one trade is ever adjusted; the residual is never spread across trades.

use crate::domain::config::PlannerConfig;
use crate::domain::errors::PlanningError;
use crate::domain::planning::round_cents;
use crate::domain::session::trade::{Trade, TradeOutcome};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AlignmentStatus {
    /// Realized profit was already within tolerance; nothing was touched
    AlreadyAligned,
    /// A trade was rewritten and the gap closed within tolerance
    Reconciled,
    /// The pass budget ran out, or no trade could absorb the gap
    Unreconciled { residual: Decimal },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentReport {
    pub status: AlignmentStatus,
    pub target_profit: Decimal,
    /// Realized profit before alignment
    pub initial_profit: Decimal,
    /// Realized profit after alignment
    pub final_profit: Decimal,
    pub adjusted_trade: Option<Uuid>,
    pub passes: usize,
}

impl AlignmentReport {
    pub fn is_reconciled(&self) -> bool {
        !matches!(self.status, AlignmentStatus::Unreconciled { .. })
    }

    pub fn residual(&self) -> Decimal {
        self.target_profit - self.final_profit
    }
}

#[derive(Debug, Clone)]
pub struct ProfitAligner {
    tolerance: Decimal,
    max_passes: usize,
}

impl ProfitAligner {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            tolerance: config.alignment_tolerance,
            max_passes: config.alignment_max_passes,
        }
    }

    /// Nudge one completed trade so that realized profit matches `target_profit`.
    ///
    /// Pending trades are ignored. Fails only when there is no completed trade.
    pub fn align(
        &self,
        trades: &mut [Trade],
        target_profit: Decimal,
    ) -> Result<AlignmentReport, PlanningError> {
        if !trades.iter().any(|t| !t.is_pending()) {
            return Err(PlanningError::NoCompletedTrades);
        }

        let initial_profit = Self::realized_profit(trades);
        let mut gap = target_profit - initial_profit;

        let mut report = AlignmentReport {
            status: AlignmentStatus::AlreadyAligned,
            target_profit,
            initial_profit,
            final_profit: initial_profit,
            adjusted_trade: None,
            passes: 0,
        };

        if gap.abs() < self.tolerance {
            debug!(
                "ProfitAligner: Realized profit {} already on target {}",
                initial_profit, target_profit
            );
            return Ok(report);
        }

        let Some(index) = Self::select_candidate(trades, gap) else {
            // Unreachable while at least one trade is completed
            report.status = AlignmentStatus::Unreconciled { residual: gap };
            return Ok(report);
        };

        let original = trades[index].clone();
        let Some(outcome) = original.outcome() else {
            report.status = AlignmentStatus::Unreconciled { residual: gap };
            return Ok(report);
        };
        let ratio = Self::original_ratio(&original);

        info!(
            "ProfitAligner: Gap of ${} to target ${}, adjusting trade #{} ({}, investment ${}, P&L ${})",
            gap,
            target_profit,
            original.sequence,
            outcome,
            original.investment,
            original.profit_or_loss
        );

        while report.passes < self.max_passes && gap.abs() >= self.tolerance {
            let trade = &mut trades[index];
            let adjusted = match outcome {
                TradeOutcome::Won => match ratio {
                    Some(ratio) => Self::adjust_won(trade, ratio, gap, report.passes == 0),
                    None => None,
                },
                TradeOutcome::Lost => Some(Self::adjust_lost(trade, gap)),
            };

            let Some((investment, profit)) = adjusted else {
                warn!(
                    "ProfitAligner: Trade #{} has no usable profit ratio, cannot absorb the gap",
                    trade.sequence
                );
                break;
            };

            trade.investment = investment;
            trade.profit_or_loss = profit;
            trade.profit_or_loss_percentage = Self::percentage(profit, investment);

            report.passes += 1;
            report.adjusted_trade = Some(trade.id);
            gap = target_profit - Self::realized_profit(trades);

            debug!(
                "ProfitAligner: Pass {}: investment ${}, P&L ${}, remaining gap ${}",
                report.passes, investment, profit, gap
            );
        }

        report.final_profit = Self::realized_profit(trades);
        if gap.abs() < self.tolerance {
            report.status = AlignmentStatus::Reconciled;
            info!(
                "ProfitAligner: Reconciled to ${} in {} pass(es)",
                report.final_profit, report.passes
            );
        } else {
            report.status = AlignmentStatus::Unreconciled { residual: gap };
            warn!(
                "ProfitAligner: Unreconciled residual ${} after {} pass(es)",
                gap, report.passes
            );
        }

        Ok(report)
    }

    fn realized_profit(trades: &[Trade]) -> Decimal {
        trades
            .iter()
            .filter(|t| !t.is_pending())
            .map(|t| t.profit_or_loss)
            .sum()
    }

    fn select_candidate(trades: &[Trade], gap: Decimal) -> Option<usize> {
        let preferred = if gap > Decimal::ZERO {
            TradeOutcome::Won
        } else {
            TradeOutcome::Lost
        };

        let completed = || trades.iter().enumerate().rev().filter(|(_, t)| !t.is_pending());

        completed()
            .find(|(_, t)| t.outcome() == Some(preferred))
            .or_else(|| completed().next())
            .map(|(i, _)| i)
    }

    /// Realized profit per unit invested, falling back to the recorded percentage
    /// when the investment is zero.
    fn original_ratio(trade: &Trade) -> Option<Decimal> {
        let ratio = if trade.investment > Decimal::ZERO {
            trade.profit_or_loss / trade.investment
        } else {
            trade.profit_or_loss_percentage / dec!(100)
        };
        (ratio > Decimal::ZERO).then_some(ratio)
    }

    /// The first pass re-derives the investment from the ratio; later passes put the
    /// remaining cent-level gap into the profit and re-derive the investment from it.
    fn adjust_won(
        trade: &Trade,
        ratio: Decimal,
        gap: Decimal,
        first_pass: bool,
    ) -> Option<(Decimal, Decimal)> {
        if first_pass {
            let investment = round_cents(((trade.profit_or_loss + gap) / ratio).max(Decimal::ZERO));
            let profit = round_cents(investment * ratio);
            Some((investment, profit))
        } else {
            let profit = round_cents((trade.profit_or_loss + gap).max(Decimal::ZERO));
            let investment = round_cents(profit / ratio);
            Some((investment, profit))
        }
    }

    /// A lost trade's investment is its loss magnitude.
    fn adjust_lost(trade: &Trade, gap: Decimal) -> (Decimal, Decimal) {
        let investment = round_cents((trade.profit_or_loss + gap).abs());
        (investment, -investment)
    }

    fn percentage(profit: Decimal, investment: Decimal) -> Decimal {
        if investment > Decimal::ZERO {
            round_cents(profit / investment * dec!(100))
        } else {
            Decimal::ZERO
        }
    }
}

impl Default for ProfitAligner {
    fn default() -> Self {
        Self::new(&PlannerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::trade::TradeStatus;

    fn completed(
        sequence: u32,
        outcome: TradeOutcome,
        investment: Decimal,
        ratio: Decimal,
    ) -> Trade {
        let mut trade = Trade::pending(Uuid::nil(), sequence, investment);
        trade.status = outcome.into();
        match outcome {
            TradeOutcome::Won => {
                trade.profit_or_loss = investment * ratio;
                trade.profit_or_loss_percentage = ratio * dec!(100);
            }
            TradeOutcome::Lost => {
                trade.profit_or_loss = -investment;
                trade.profit_or_loss_percentage = dec!(-100);
            }
        }
        trade
    }

    fn total(trades: &[Trade]) -> Decimal {
        trades.iter().map(|t| t.profit_or_loss).sum()
    }

    #[test]
    fn test_no_completed_trades_rejected() {
        let aligner = ProfitAligner::default();
        let mut trades = vec![Trade::pending(Uuid::nil(), 1, dec!(100))];
        assert_eq!(
            aligner.align(&mut trades, dec!(500)),
            Err(PlanningError::NoCompletedTrades)
        );
        let mut empty: Vec<Trade> = Vec::new();
        assert!(aligner.align(&mut empty, dec!(500)).is_err());
    }

    #[test]
    fn test_within_tolerance_is_noop() {
        let aligner = ProfitAligner::default();
        let mut trades = vec![completed(1, TradeOutcome::Won, dec!(100), dec!(3))];
        let before = trades.clone();

        let report = aligner.align(&mut trades, dec!(300.005)).unwrap();
        assert_eq!(report.status, AlignmentStatus::AlreadyAligned);
        assert_eq!(report.passes, 0);
        assert_eq!(trades, before);
    }

    #[test]
    fn test_shortfall_adjusts_latest_win_preserving_ratio() {
        let aligner = ProfitAligner::default();
        let mut trades = vec![
            completed(1, TradeOutcome::Won, dec!(100), dec!(3)),
            completed(2, TradeOutcome::Lost, dec!(50), dec!(3)),
            completed(3, TradeOutcome::Won, dec!(200), dec!(3)),
            completed(4, TradeOutcome::Lost, dec!(20), dec!(3)),
        ];
        // Realized: 300 - 50 + 600 - 20 = 830
        let report = aligner.align(&mut trades, dec!(842)).unwrap();

        assert_eq!(report.status, AlignmentStatus::Reconciled);
        assert_eq!(report.adjusted_trade, Some(trades[2].id));
        assert_eq!(trades[2].status, TradeStatus::Won);
        assert_eq!(trades[2].investment, dec!(204));
        assert_eq!(trades[2].profit_or_loss, dec!(612));
        assert_eq!(trades[2].profit_or_loss_percentage, dec!(300));
        assert_eq!(total(&trades), dec!(842));
        // Other trades untouched
        assert_eq!(trades[0].profit_or_loss, dec!(300));
    }

    #[test]
    fn test_surplus_adjusts_latest_loss() {
        let aligner = ProfitAligner::default();
        let mut trades = vec![
            completed(1, TradeOutcome::Lost, dec!(40), dec!(3)),
            completed(2, TradeOutcome::Won, dec!(100), dec!(3)),
            completed(3, TradeOutcome::Lost, dec!(30), dec!(3)),
            completed(4, TradeOutcome::Won, dec!(10), dec!(3)),
        ];
        // Realized: -40 + 300 - 30 + 30 = 260
        let report = aligner.align(&mut trades, dec!(254.50)).unwrap();

        assert_eq!(report.status, AlignmentStatus::Reconciled);
        assert_eq!(report.adjusted_trade, Some(trades[2].id));
        assert_eq!(trades[2].status, TradeStatus::Lost);
        assert_eq!(trades[2].investment, dec!(35.50));
        assert_eq!(trades[2].profit_or_loss, dec!(-35.50));
        assert_eq!(trades[2].profit_or_loss_percentage, dec!(-100));
        assert_eq!(report.final_profit, dec!(254.50));
    }

    #[test]
    fn test_corrective_pass_closes_ratio_rounding_gap() {
        let aligner = ProfitAligner::default();
        let mut trades = vec![completed(1, TradeOutcome::Won, dec!(100), dec!(3))];

        // 300 -> 301: first pass gives investment 100.33, profit 300.99
        let report = aligner.align(&mut trades, dec!(301)).unwrap();

        assert_eq!(report.status, AlignmentStatus::Reconciled);
        assert_eq!(report.passes, 2);
        assert_eq!(trades[0].profit_or_loss, dec!(301));
        assert_eq!(trades[0].investment, dec!(100.33));
        assert_eq!(trades[0].status, TradeStatus::Won);
    }

    #[test]
    fn test_falls_back_to_last_trade_without_preferred_outcome() {
        let aligner = ProfitAligner::default();
        let mut trades = vec![
            completed(1, TradeOutcome::Lost, dec!(100), dec!(2)),
            completed(2, TradeOutcome::Lost, dec!(100), dec!(2)),
        ];
        // Realized -200, target -170: no win to grow, shrink the last loss instead
        let report = aligner.align(&mut trades, dec!(-170)).unwrap();

        assert_eq!(report.status, AlignmentStatus::Reconciled);
        assert_eq!(report.adjusted_trade, Some(trades[1].id));
        assert_eq!(trades[1].profit_or_loss, dec!(-70));
        assert_eq!(trades[1].status, TradeStatus::Lost);
    }

    #[test]
    fn test_unreachable_gap_reports_residual() {
        let aligner = ProfitAligner::default();
        let mut trades = vec![completed(1, TradeOutcome::Won, dec!(100), dec!(2))];
        // A win cannot go below zero profit
        let report = aligner.align(&mut trades, dec!(-50)).unwrap();

        assert_eq!(report.status, AlignmentStatus::Unreconciled { residual: dec!(-50) });
        assert!(!report.is_reconciled());
        assert_eq!(report.residual(), dec!(-50));
        assert_eq!(trades[0].status, TradeStatus::Won);
        assert_eq!(trades[0].profit_or_loss, Decimal::ZERO);
        assert!(report.passes <= 3);
    }

    #[test]
    fn test_zero_investment_win_uses_recorded_percentage() {
        let aligner = ProfitAligner::default();
        let mut trade = completed(1, TradeOutcome::Won, dec!(0), dec!(2));
        trade.profit_or_loss = Decimal::ZERO;
        let mut trades = vec![trade];

        let report = aligner.align(&mut trades, dec!(50)).unwrap();
        assert_eq!(report.status, AlignmentStatus::Reconciled);
        assert_eq!(trades[0].investment, dec!(25));
        assert_eq!(trades[0].profit_or_loss, dec!(50));
    }

    #[test]
    fn test_win_without_ratio_cannot_be_adjusted() {
        let aligner = ProfitAligner::default();
        let mut trade = completed(1, TradeOutcome::Won, dec!(0), dec!(2));
        trade.profit_or_loss = Decimal::ZERO;
        trade.profit_or_loss_percentage = Decimal::ZERO;
        let mut trades = vec![trade];
        let before = trades.clone();

        let report = aligner.align(&mut trades, dec!(50)).unwrap();
        assert_eq!(report.status, AlignmentStatus::Unreconciled { residual: dec!(50) });
        assert_eq!(report.adjusted_trade, None);
        assert_eq!(trades, before);
    }

    #[test]
    fn test_pending_trades_ignored() {
        let aligner = ProfitAligner::default();
        let mut trades = vec![
            completed(1, TradeOutcome::Won, dec!(100), dec!(1)),
            Trade::pending(Uuid::nil(), 2, dec!(80)),
        ];
        let report = aligner.align(&mut trades, dec!(110)).unwrap();

        assert_eq!(report.initial_profit, dec!(100));
        assert_eq!(report.adjusted_trade, Some(trades[0].id));
        assert!(trades[1].is_pending());
        assert_eq!(trades[1].investment, dec!(80));
    }
}
