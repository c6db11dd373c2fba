use crate::domain::planning::balance_table::RequiredBalanceTable;
use crate::domain::planning::{ceil_cents, round_cents};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Sizes the next stake from the required-balance table.
///
/// The stake is chosen so that a loss still leaves the balance needed for the
/// same wins over one fewer trade, and a win reaches the balance needed for
/// one fewer win. Following it under any outcome sequence that delivers the
/// required wins in time ends at or above the target balance.
pub struct StakePlanner;

impl StakePlanner {
    /// Stake for the next trade, or zero when no trade should be created.
    pub fn next_stake(
        current_balance: Decimal,
        remaining_trades: u32,
        wins_needed: u32,
        risk_reward_ratio: Decimal,
        table: &RequiredBalanceTable,
    ) -> Decimal {
        if remaining_trades == 0 || wins_needed == 0 || current_balance <= Decimal::ZERO {
            debug!(
                "StakePlanner: Nothing to plan (balance={}, remaining={}, wins_needed={})",
                current_balance, remaining_trades, wins_needed
            );
            return Decimal::ZERO;
        }

        if risk_reward_ratio <= Decimal::ZERO || !table.contains(wins_needed, remaining_trades) {
            warn!(
                "StakePlanner: State (wins_needed={}, remaining={}) outside table or invalid R={}",
                wins_needed, remaining_trades, risk_reward_ratio
            );
            return Decimal::ZERO;
        }

        let next = remaining_trades - 1;
        let loss_req = table.get(wins_needed, next);
        let win_req = table.get(wins_needed - 1, next);

        // 1. Largest stake that survives a loss; all-in when the loss branch is lost anyway
        let mut stake = match loss_req {
            Some(required) => current_balance - required,
            None => current_balance,
        };

        // 2. Smallest stake that, if it wins, clears the win branch
        if let Some(required) = win_req {
            let min_stake_for_win =
                ceil_cents(((required - current_balance) / risk_reward_ratio).max(Decimal::ZERO));
            if min_stake_for_win > stake {
                debug!(
                    "StakePlanner: Raised stake to win floor: ${} -> ${}",
                    stake, min_stake_for_win
                );
                stake = min_stake_for_win;
            }
        }

        // 3. Clamp to the balance
        let stake = round_cents(stake.clamp(Decimal::ZERO, current_balance));

        debug!(
            "StakePlanner: balance=${}, wins_needed={}, remaining={}, loss_req={:?}, win_req={:?} -> stake=${}",
            current_balance, wins_needed, remaining_trades, loss_req, win_req, stake
        );

        if stake <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        // 4. A win must leave a representable balance
        let balance_after_win = stake
            .checked_mul(risk_reward_ratio)
            .and_then(|profit| current_balance.checked_add(profit));
        if balance_after_win.is_none() {
            warn!(
                "StakePlanner: Win on stake ${} at R={} overflows balance ${}, no trade planned",
                stake, risk_reward_ratio, current_balance
            );
            return Decimal::ZERO;
        }
        stake
    }
}
