use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User-supplied verdict for a pending trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    Won,
    Lost,
}

impl fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeOutcome::Won => write!(f, "WON"),
            TradeOutcome::Lost => write!(f, "LOST"),
        }
    }
}

impl TryFrom<char> for TradeOutcome {
    type Error = anyhow::Error;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'W' => Ok(TradeOutcome::Won),
            'L' => Ok(TradeOutcome::Lost),
            _ => anyhow::bail!("Invalid outcome '{}'. Must be 'W' or 'L'", c),
        }
    }
}

/// Lifecycle state of a planned trade.
///
/// `Pending` transitions exactly once to `Won` or `Lost` and is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Pending,
    Won,
    Lost,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Pending => write!(f, "PENDING"),
            TradeStatus::Won => write!(f, "WON"),
            TradeStatus::Lost => write!(f, "LOST"),
        }
    }
}

impl From<TradeOutcome> for TradeStatus {
    fn from(outcome: TradeOutcome) -> Self {
        match outcome {
            TradeOutcome::Won => TradeStatus::Won,
            TradeOutcome::Lost => TradeStatus::Lost,
        }
    }
}

/// A planned trade within a session.
///
/// While pending only `investment` (the stake) is meaningful; once resolved the
/// profit fields hold the realized result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub session_id: Uuid,
    /// 1-based position of the trade within its session
    pub sequence: u32,
    pub investment: Decimal,
    pub profit_or_loss: Decimal,
    pub profit_or_loss_percentage: Decimal,
    pub status: TradeStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Trade {
    /// Create a new pending trade with the given stake
    pub fn pending(session_id: Uuid, sequence: u32, stake: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            sequence,
            investment: stake,
            profit_or_loss: Decimal::ZERO,
            profit_or_loss_percentage: Decimal::ZERO,
            status: TradeStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TradeStatus::Pending
    }

    pub fn outcome(&self) -> Option<TradeOutcome> {
        match self.status {
            TradeStatus::Pending => None,
            TradeStatus::Won => Some(TradeOutcome::Won),
            TradeStatus::Lost => Some(TradeOutcome::Lost),
        }
    }

    /// Resolution time for completed trades, creation time otherwise
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.resolved_at.unwrap_or(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pending_trade() {
        let session_id = Uuid::new_v4();
        let trade = Trade::pending(session_id, 1, dec!(125.50));

        assert!(trade.is_pending());
        assert_eq!(trade.outcome(), None);
        assert_eq!(trade.session_id, session_id);
        assert_eq!(trade.investment, dec!(125.50));
        assert_eq!(trade.profit_or_loss, Decimal::ZERO);
        assert_eq!(trade.timestamp(), trade.created_at);
    }

    #[test]
    fn test_outcome_parsing() {
        assert_eq!(TradeOutcome::try_from('w').unwrap(), TradeOutcome::Won);
        assert_eq!(TradeOutcome::try_from('L').unwrap(), TradeOutcome::Lost);
        assert!(TradeOutcome::try_from('x').is_err());
    }

    #[test]
    fn test_status_from_outcome() {
        assert_eq!(TradeStatus::from(TradeOutcome::Won), TradeStatus::Won);
        assert_eq!(TradeStatus::from(TradeOutcome::Lost), TradeStatus::Lost);
        assert_eq!(TradeStatus::Lost.to_string(), "LOST");
    }
}
