// Profit alignment (post-hoc residual correction)
pub mod alignment;

// Required-balance DP table
pub mod balance_table;

// Win/loss outcome recording
pub mod outcome;

// Plan replay and Monte Carlo simulation
pub mod simulation;

// Next-stake sizing
pub mod stake_planner;

// Aspirational target profit
pub mod target_profit;

pub use alignment::{AlignmentReport, AlignmentStatus, ProfitAligner};
pub use balance_table::RequiredBalanceTable;
pub use outcome::{OutcomeRecorder, RealizedResult};
pub use simulation::{
    MonteCarloConfig, MonteCarloPlanner, MonteCarloResult, ReplayResult, ReplayStep, replay,
};
pub use stake_planner::StakePlanner;
pub use target_profit::TargetProfitCalculator;

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a currency amount half-up to cents
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a currency amount up to the next cent
pub fn ceil_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity)
}
