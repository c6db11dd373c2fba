use crate::domain::config::PlannerConfig;
use crate::domain::errors::PlanningError;
use crate::domain::planning::balance_table::RequiredBalanceTable;
use crate::domain::planning::outcome::OutcomeRecorder;
use crate::domain::planning::stake_planner::StakePlanner;
use crate::domain::planning::target_profit::TargetProfitCalculator;
use crate::domain::session::parameters::SessionParameters;
use crate::domain::session::planning_session::{PlanningSession, SessionStatus};
use crate::domain::session::trade::TradeOutcome;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One planned and resolved trade of a replay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayStep {
    pub sequence: u32,
    pub balance_before: Decimal,
    pub stake: Decimal,
    pub outcome: TradeOutcome,
    pub profit_or_loss: Decimal,
    pub balance_after: Decimal,
    pub wins_needed_after: u32,
    pub remaining_after: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayResult {
    pub target_profit: Decimal,
    pub target_balance: Decimal,
    pub steps: Vec<ReplayStep>,
    pub final_balance: Decimal,
    pub status: SessionStatus,
    /// Outcomes left over once the planner stopped creating trades
    pub unused_outcomes: usize,
}

impl ReplayResult {
    pub fn target_reached(&self) -> bool {
        self.target_profit > Decimal::ZERO && self.final_balance >= self.target_balance
    }
}

/// Run a session plan against a fixed outcome sequence.
///
/// Trades are planned one at a time and resolved with the next outcome until
/// the outcomes run out or the planner stops creating trades.
pub fn replay(
    params: SessionParameters,
    config: &PlannerConfig,
    outcomes: &[TradeOutcome],
) -> Result<ReplayResult, PlanningError> {
    let mut session = PlanningSession::new(params, config);
    let mut steps = Vec::with_capacity(outcomes.len());

    for &outcome in outcomes {
        let balance_before = session.state().current_balance;
        let Some(trade) = session.plan_next_trade()? else {
            break;
        };
        let resolved = session.record_outcome(trade.id, outcome)?;

        steps.push(ReplayStep {
            sequence: resolved.sequence,
            balance_before,
            stake: resolved.investment,
            outcome,
            profit_or_loss: resolved.profit_or_loss,
            balance_after: session.state().current_balance,
            wins_needed_after: session.wins_needed(),
            remaining_after: session.remaining_trades(),
        });
    }

    let result = ReplayResult {
        target_profit: session.target_profit(),
        target_balance: session.target_balance(),
        final_balance: session.state().current_balance,
        status: session.status(),
        unused_outcomes: outcomes.len() - steps.len(),
        steps,
    };

    info!(
        "Replay: {} trades, final balance ${} vs target ${} ({:?})",
        result.steps.len(),
        result.final_balance,
        result.target_balance,
        result.status
    );

    Ok(result)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub iterations: usize,
    /// Probability that any single trade wins
    pub win_rate: f64,
    /// Fixed seed for reproducible runs; drawn from the OS when absent
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub iterations: usize,
    pub target_balance: Decimal,
    pub final_balance_mean: Decimal,
    pub final_balance_median: Decimal,
    pub percentile_5: Decimal,
    pub percentile_95: Decimal,
    pub probability_target_reached: f64,
    pub probability_wins_reached: f64,
    pub probability_of_profit: f64,
}

struct RunOutcome {
    final_balance: Decimal,
    wins_reached: bool,
}

/// Monte Carlo evaluation of the stake plan under random outcomes
pub struct MonteCarloPlanner;

impl MonteCarloPlanner {
    pub fn simulate(
        params: &SessionParameters,
        planner_config: &PlannerConfig,
        config: &MonteCarloConfig,
    ) -> MonteCarloResult {
        let target_profit = TargetProfitCalculator::new(planner_config).compute(params);
        let table = PlanningSession::build_table(params, target_profit);
        let target_balance = params.capital + target_profit;
        let win_rate = config.win_rate.clamp(0.0, 1.0);
        let base_seed = config.seed.unwrap_or_else(|| rand::rng().random());

        let mut runs: Vec<RunOutcome> = (0..config.iterations)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));
                Self::run_once(params, &table, win_rate, &mut rng)
            })
            .collect();

        if runs.is_empty() {
            return MonteCarloResult {
                iterations: 0,
                target_balance,
                final_balance_mean: params.capital,
                final_balance_median: params.capital,
                percentile_5: params.capital,
                percentile_95: params.capital,
                probability_target_reached: 0.0,
                probability_wins_reached: 0.0,
                probability_of_profit: 0.0,
            };
        }

        runs.sort_by(|a, b| a.final_balance.cmp(&b.final_balance));

        let n = runs.len();
        let count = Decimal::from(n);
        let mean = runs
            .iter()
            .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r.final_balance))
            .map(|total| total / count)
            .unwrap_or_else(|| runs.iter().map(|r| r.final_balance / count).sum());
        let reached = runs
            .iter()
            .filter(|r| target_profit > Decimal::ZERO && r.final_balance >= target_balance)
            .count();
        let wins_reached = runs.iter().filter(|r| r.wins_reached).count();
        let profitable = runs
            .iter()
            .filter(|r| r.final_balance > params.capital)
            .count();

        let result = MonteCarloResult {
            iterations: n,
            target_balance,
            final_balance_mean: mean.round_dp(2),
            final_balance_median: runs[n / 2].final_balance,
            percentile_5: runs[n * 5 / 100].final_balance,
            percentile_95: runs[n * 95 / 100].final_balance,
            probability_target_reached: reached as f64 / n as f64,
            probability_wins_reached: wins_reached as f64 / n as f64,
            probability_of_profit: profitable as f64 / n as f64,
        };

        info!(
            "MonteCarloPlanner: {} runs at win rate {:.2}: P(target)={:.3}, median ${}",
            n, win_rate, result.probability_target_reached, result.final_balance_median
        );

        result
    }

    fn run_once(
        params: &SessionParameters,
        table: &RequiredBalanceTable,
        win_rate: f64,
        rng: &mut StdRng,
    ) -> RunOutcome {
        let required_wins = params.required_wins();
        let mut balance = params.capital;
        let mut wins = 0u32;
        let mut completed = 0u32;

        while completed < params.total_trades && wins < required_wins {
            let stake = StakePlanner::next_stake(
                balance,
                params.total_trades - completed,
                required_wins - wins,
                params.risk_reward_ratio,
                table,
            );
            if stake <= Decimal::ZERO {
                break;
            }

            let outcome = if rng.random_bool(win_rate) {
                TradeOutcome::Won
            } else {
                TradeOutcome::Lost
            };
            let next_balance = OutcomeRecorder::evaluate(stake, params.risk_reward_ratio, outcome)
                .ok()
                .and_then(|result| balance.checked_add(result.profit_or_loss));
            let Some(next_balance) = next_balance else {
                break;
            };
            if outcome == TradeOutcome::Won {
                wins += 1;
            }
            balance = next_balance;
            completed += 1;
        }

        RunOutcome {
            final_balance: balance,
            wins_reached: wins >= required_wins,
        }
    }
}
