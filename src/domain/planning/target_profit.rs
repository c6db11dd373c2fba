use crate::domain::config::PlannerConfig;
use crate::domain::planning::round_cents;
use crate::domain::session::parameters::SessionParameters;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tracing::{debug, warn};

/// Aspirational target profit of a session.
///
/// The target compounds a fixed benchmark win rate, not the session's own
/// accuracy, so it is a goal rather than a forecast.
#[derive(Debug, Clone)]
pub struct TargetProfitCalculator {
    benchmark_win_rate: Decimal,
    base_risk_fraction: Decimal,
}

impl TargetProfitCalculator {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            benchmark_win_rate: config.benchmark_win_rate,
            base_risk_fraction: config.base_risk_fraction,
        }
    }

    /// Target profit for the given parameters.
    ///
    /// Returns zero for invalid parameters, for configurations whose
    /// benchmark growth multiplier does not exceed 1, and for targets too
    /// large to represent.
    pub fn compute(&self, params: &SessionParameters) -> Decimal {
        if let Err(e) = params.validate() {
            warn!("TargetProfitCalculator: No target for {:?}: {}", params, e);
            return Decimal::ZERO;
        }

        let multiplier = self.multiplier(params.total_trades, params.risk_reward_ratio);
        if !multiplier.is_finite() || multiplier <= 1.0 {
            debug!(
                "TargetProfitCalculator: Non-profitable configuration (multiplier={:.6}), target is 0",
                multiplier
            );
            return Decimal::ZERO;
        }

        let raw_profit = Decimal::from_f64(multiplier)
            .and_then(|m| params.capital.checked_mul(m))
            .map(|balance| balance - params.capital);
        let Some(raw_profit) = raw_profit else {
            warn!(
                "TargetProfitCalculator: Target balance overflows for {:?} (multiplier={})",
                params, multiplier
            );
            return Decimal::ZERO;
        };

        let step = Self::rounding_step(params.risk_reward_ratio);
        let stepped = (raw_profit / step)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(step)
            .filter(|profit| params.capital.checked_add(*profit).is_some());
        let Some(stepped) = stepped else {
            warn!(
                "TargetProfitCalculator: Target balance overflows for {:?} (multiplier={})",
                params, multiplier
            );
            return Decimal::ZERO;
        };
        let target = round_cents(stepped).max(Decimal::ZERO);

        debug!(
            "TargetProfitCalculator: multiplier={:.6}, raw={}, step={}, target={}",
            multiplier, raw_profit, step, target
        );

        target
    }

    /// Benchmark balance multiplier:
    /// `(1 + R·β)^(N·p) · (1 − β)^(N·(1 − p))`, fractional trade counts allowed.
    pub fn multiplier(&self, total_trades: u32, risk_reward_ratio: Decimal) -> f64 {
        let win_rate = self.benchmark_win_rate.to_f64().unwrap_or(0.0);
        let beta = self.base_risk_fraction.to_f64().unwrap_or(0.0);
        let ratio = risk_reward_ratio.to_f64().unwrap_or(0.0);

        let trades = f64::from(total_trades);
        let expected_wins = trades * win_rate;
        let expected_losses = trades - expected_wins;

        let win_multiplier = 1.0 + ratio * beta;
        let loss_multiplier = 1.0 - beta;

        win_multiplier.powf(expected_wins) * loss_multiplier.powf(expected_losses)
    }

    /// Cosmetic smoothing step: `max(round(R·0.01, 2), 0.01)`
    pub fn rounding_step(risk_reward_ratio: Decimal) -> Decimal {
        round_cents(risk_reward_ratio * dec!(0.01)).max(dec!(0.01))
    }
}

impl Default for TargetProfitCalculator {
    fn default() -> Self {
        Self::new(&PlannerConfig::default())
    }
}
