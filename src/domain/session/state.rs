use crate::domain::session::trade::{Trade, TradeStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Runtime state of a session, derived from its completed trades.
///
/// Invariant: `current_balance = capital + Σ profit_or_loss` over completed trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRuntimeState {
    /// Completed winning trades so far
    pub wins: u32,

    /// Completed trades (won or lost)
    pub completed_trades: u32,

    /// Capital plus realized profit/loss
    pub current_balance: Decimal,
}

impl SessionRuntimeState {
    pub fn new(capital: Decimal) -> Self {
        Self {
            wins: 0,
            completed_trades: 0,
            current_balance: capital,
        }
    }

    /// Rebuild state from a trade history. Pending trades are ignored.
    pub fn from_trades(capital: Decimal, trades: &[Trade]) -> Self {
        let mut state = Self::new(capital);
        for trade in trades {
            state.apply(trade);
        }
        state
    }

    /// Fold one resolved trade into the state. Pending trades are a no-op.
    pub fn apply(&mut self, trade: &Trade) {
        match trade.status {
            TradeStatus::Pending => return,
            TradeStatus::Won => self.wins += 1,
            TradeStatus::Lost => {}
        }
        self.completed_trades += 1;
        self.current_balance += trade.profit_or_loss;
    }

    /// Realized profit/loss relative to the starting capital
    pub fn realized_profit(&self, capital: Decimal) -> Decimal {
        self.current_balance - capital
    }
}
