//! Planning Session Aggregate
//!
//! Drives one session through the planner: target computation, table lookup,
//! stake sizing, outcome recording and profit alignment.
//!
//! # Invariants
//!
//! - At most one pending trade at a time
//! - `state.current_balance = capital + Σ profit_or_loss` over completed trades,
//!   including after an alignment rewrite

use crate::domain::config::PlannerConfig;
use crate::domain::errors::PlanningError;
use crate::domain::planning::{
    AlignmentReport, OutcomeRecorder, ProfitAligner, RequiredBalanceTable, StakePlanner,
    TargetProfitCalculator,
};
use crate::domain::session::parameters::SessionParameters;
use crate::domain::session::record::SessionRecord;
use crate::domain::session::state::SessionRuntimeState;
use crate::domain::session::trade::{Trade, TradeOutcome};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    /// Wins still needed and trades left to take them
    Active,
    /// The required number of wins has been reached
    WinsReached,
    /// All planned trades are completed without reaching the required wins
    TradesExhausted,
}

/// Point-in-time view of a session's progress toward its target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProgress {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub wins: u32,
    pub completed_trades: u32,
    pub remaining_trades: u32,
    pub wins_needed: u32,
    pub current_balance: Decimal,
    pub realized_profit: Decimal,
    pub target_profit: Decimal,
    pub target_balance: Decimal,
    /// Realized profit as a percentage of the target profit
    pub target_progress_pct: Decimal,
    pub pending_stake: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct PlanningSession {
    id: Uuid,
    params: SessionParameters,
    target_profit: Decimal,
    required_wins: u32,
    table: Arc<RequiredBalanceTable>,
    state: SessionRuntimeState,
    trades: Vec<Trade>,
    aligner: ProfitAligner,
}

impl PlanningSession {
    /// Start a new session, building its required-balance table
    pub fn new(params: SessionParameters, config: &PlannerConfig) -> Self {
        let target_profit = TargetProfitCalculator::new(config).compute(&params);
        let table = Self::build_table(&params, target_profit);
        Self::assemble(Uuid::new_v4(), params, config, target_profit, Arc::new(table), Vec::new())
    }

    /// Restore a persisted session around a previously built target and table
    pub fn restore(
        record: &SessionRecord,
        config: &PlannerConfig,
        target_profit: Decimal,
        table: Arc<RequiredBalanceTable>,
        mut trades: Vec<Trade>,
    ) -> Self {
        trades.sort_by_key(|t| t.sequence);
        Self::assemble(record.id, record.parameters, config, target_profit, table, trades)
    }

    /// Required-balance table for a parameter set and its target profit
    pub fn build_table(params: &SessionParameters, target_profit: Decimal) -> RequiredBalanceTable {
        let target_balance = params.capital.checked_add(target_profit);
        let Some(target_balance) = target_balance.filter(|_| params.is_valid()) else {
            return RequiredBalanceTable::empty();
        };
        RequiredBalanceTable::build(
            target_balance,
            params.risk_reward_ratio,
            params.total_trades,
            params.required_wins(),
        )
    }

    fn assemble(
        id: Uuid,
        params: SessionParameters,
        config: &PlannerConfig,
        target_profit: Decimal,
        table: Arc<RequiredBalanceTable>,
        trades: Vec<Trade>,
    ) -> Self {
        let state = SessionRuntimeState::from_trades(params.capital, &trades);
        Self {
            id,
            params,
            target_profit,
            required_wins: params.required_wins(),
            table,
            state,
            trades,
            aligner: ProfitAligner::new(config),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn parameters(&self) -> &SessionParameters {
        &self.params
    }

    pub fn target_profit(&self) -> Decimal {
        self.target_profit
    }

    pub fn target_balance(&self) -> Decimal {
        self.params.capital + self.target_profit
    }

    pub fn required_wins(&self) -> u32 {
        self.required_wins
    }

    pub fn table(&self) -> &RequiredBalanceTable {
        &self.table
    }

    pub fn state(&self) -> &SessionRuntimeState {
        &self.state
    }

    /// All trades in sequence order, the pending one included
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn pending_trade(&self) -> Option<&Trade> {
        self.trades.iter().find(|t| t.is_pending())
    }

    pub fn wins_needed(&self) -> u32 {
        self.required_wins.saturating_sub(self.state.wins)
    }

    pub fn remaining_trades(&self) -> u32 {
        self.params.total_trades.saturating_sub(self.state.completed_trades)
    }

    pub fn status(&self) -> SessionStatus {
        if self.wins_needed() == 0 {
            SessionStatus::WinsReached
        } else if self.remaining_trades() == 0 {
            SessionStatus::TradesExhausted
        } else {
            SessionStatus::Active
        }
    }

    /// Size and open the next trade.
    ///
    /// Returns `Ok(None)` when the session is no longer active or no stake can
    /// be justified from the current balance.
    pub fn plan_next_trade(&mut self) -> Result<Option<Trade>, PlanningError> {
        if let Some(pending) = self.pending_trade() {
            return Err(PlanningError::TradePending {
                session_id: self.id,
                trade_id: pending.id,
            });
        }

        if self.status() != SessionStatus::Active {
            info!("Session {}: {:?}, no further trades planned", self.id, self.status());
            return Ok(None);
        }

        let stake = StakePlanner::next_stake(
            self.state.current_balance,
            self.remaining_trades(),
            self.wins_needed(),
            self.params.risk_reward_ratio,
            &self.table,
        );

        if stake <= Decimal::ZERO {
            info!(
                "Session {}: No stake justified at balance ${} (wins_needed={}, remaining={})",
                self.id,
                self.state.current_balance,
                self.wins_needed(),
                self.remaining_trades()
            );
            return Ok(None);
        }

        let trade = Trade::pending(self.id, self.state.completed_trades + 1, stake);
        info!(
            "Session {}: Planned trade #{} with stake ${} (balance ${}, wins_needed={}, remaining={})",
            self.id,
            trade.sequence,
            stake,
            self.state.current_balance,
            self.wins_needed(),
            self.remaining_trades()
        );
        self.trades.push(trade.clone());
        Ok(Some(trade))
    }

    /// Resolve a trade of this session and fold it into the runtime state
    pub fn record_outcome(
        &mut self,
        trade_id: Uuid,
        outcome: TradeOutcome,
    ) -> Result<Trade, PlanningError> {
        let session_id = self.id;
        let trade = self
            .trades
            .iter_mut()
            .find(|t| t.id == trade_id)
            .ok_or(PlanningError::TradeNotFound {
                session_id,
                trade_id,
            })?;

        if trade.is_pending() {
            let result = OutcomeRecorder::evaluate(
                trade.investment,
                self.params.risk_reward_ratio,
                outcome,
            )?;
            self.state
                .current_balance
                .checked_add(result.profit_or_loss)
                .ok_or(PlanningError::AmountOverflow("session balance"))?;
        }

        OutcomeRecorder::record(trade, self.params.risk_reward_ratio, outcome)?;
        let trade = trade.clone();
        self.state.apply(&trade);
        Ok(trade)
    }

    /// Rewrite one completed trade so realized profit lands on the target
    pub fn align_profit(&mut self) -> Result<AlignmentReport, PlanningError> {
        let report = self.aligner.align(&mut self.trades, self.target_profit)?;
        self.state = SessionRuntimeState::from_trades(self.params.capital, &self.trades);
        Ok(report)
    }

    pub fn progress(&self) -> SessionProgress {
        let realized_profit = self.state.realized_profit(self.params.capital);
        let target_progress_pct = if self.target_profit > Decimal::ZERO {
            (realized_profit / self.target_profit)
                .checked_mul(dec!(100))
                .map_or(Decimal::MAX, |pct| pct.round_dp(2))
        } else {
            Decimal::ZERO
        };

        SessionProgress {
            session_id: self.id,
            status: self.status(),
            wins: self.state.wins,
            completed_trades: self.state.completed_trades,
            remaining_trades: self.remaining_trades(),
            wins_needed: self.wins_needed(),
            current_balance: self.state.current_balance,
            realized_profit,
            target_profit: self.target_profit,
            target_balance: self.target_balance(),
            target_progress_pct,
            pending_stake: self.pending_trade().map(|t| t.investment),
        }
    }
}
