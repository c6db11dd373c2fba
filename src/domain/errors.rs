use crate::domain::session::trade::TradeStatus;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised when a caller breaks a planning precondition.
///
/// Every variant is returned before any state is touched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanningError {
    #[error("Trade {trade_id} is not pending (status: {status})")]
    TradeNotPending { trade_id: Uuid, status: TradeStatus },

    #[error("Trade {trade_id} not found in session {session_id}")]
    TradeNotFound { session_id: Uuid, trade_id: Uuid },

    #[error("Session {session_id} already has a pending trade: {trade_id}")]
    TradePending { session_id: Uuid, trade_id: Uuid },

    #[error("No completed trades to align")]
    NoCompletedTrades,

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Session {session_id} already has {trades} trade(s); parameters are locked")]
    ParametersLocked { session_id: Uuid, trades: usize },

    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),
}

/// Errors related to session parameter validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Capital must be positive, got {0}")]
    NonPositiveCapital(Decimal),

    #[error("Total trades must be positive")]
    NoTrades,

    #[error("Accuracy must be within [0, 100], got {0}")]
    AccuracyOutOfRange(Decimal),

    #[error("Risk:reward ratio must be positive, got {0}")]
    NonPositiveRiskReward(Decimal),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_planning_error_formatting() {
        let trade_id = Uuid::new_v4();
        let error = PlanningError::TradeNotPending {
            trade_id,
            status: TradeStatus::Won,
        };

        let msg = error.to_string();
        assert!(msg.contains(&trade_id.to_string()));
        assert!(msg.contains("WON"));
    }

    #[test]
    fn test_amount_overflow_formatting() {
        let msg = PlanningError::AmountOverflow("win profit").to_string();
        assert_eq!(msg, "Amount overflow while computing win profit");
    }

    #[test]
    fn test_parameter_error_formatting() {
        let msg = ParameterError::AccuracyOutOfRange(dec!(120)).to_string();
        assert!(msg.contains("120"));
        assert!(msg.contains("[0, 100]"));
    }
}
