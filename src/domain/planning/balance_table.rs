//! Required-balance table.
//!
//! `req[w][r]` is the minimum balance from which, with `r` trades remaining and
//! `w` wins still required among them, some stake sequence reaches the target
//! balance by the last trade. Unreachable cells (`r < w`) are `None`, standing
//! for an infinite requirement.
//!
//! From balance `B` with stake `s`, a win must leave `B + R·s ≥ winReq` and a
//! loss `B − s ≥ lossReq`. The smallest `B` admitting such an `s` is
//! `(winReq + R·lossReq) / (R + 1)`, floored at `lossReq` for the `s = 0` case.
//!
//! Finite cells are rounded up to the cent so that cent-precision stakes taken
//! from the table never leave the balance below the next requirement.

use crate::domain::planning::ceil_cents;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug)]
struct CellOverflow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequiredBalanceTable {
    target_balance: Decimal,
    required_wins: u32,
    total_trades: u32,
    /// Row-major by wins needed, `total_trades + 1` cells per row
    cells: Vec<Option<Decimal>>,
}

impl RequiredBalanceTable {
    /// Build the table for a session.
    ///
    /// Returns an empty table if the target balance or risk:reward ratio is not
    /// positive, if there are no trades, or if a cell overflows `Decimal`.
    /// `required_wins` is clamped to `total_trades`.
    pub fn build(
        target_balance: Decimal,
        risk_reward_ratio: Decimal,
        total_trades: u32,
        required_wins: u32,
    ) -> Self {
        if target_balance <= Decimal::ZERO
            || risk_reward_ratio <= Decimal::ZERO
            || total_trades == 0
        {
            warn!(
                "RequiredBalanceTable: Invalid configuration (target={}, R={}, trades={}), table is empty",
                target_balance, risk_reward_ratio, total_trades
            );
            return Self::empty();
        }

        let required_wins = required_wins.min(total_trades);
        let width = total_trades as usize + 1;
        let rows = required_wins as usize + 1;
        let mut cells: Vec<Option<Decimal>> = vec![None; rows * width];

        let target = ceil_cents(target_balance);
        for cell in cells.iter_mut().take(width) {
            *cell = Some(target);
        }

        let Some(divisor) = risk_reward_ratio.checked_add(Decimal::ONE) else {
            warn!("RequiredBalanceTable: R={} overflows, table is empty", risk_reward_ratio);
            return Self::empty();
        };
        for w in 1..rows {
            for r in w..width {
                let loss_req = cells[(w * width) + r - 1];
                let win_req = cells[((w - 1) * width) + r - 1];

                let Ok(required) = Self::requirement(loss_req, win_req, risk_reward_ratio, divisor)
                else {
                    warn!(
                        "RequiredBalanceTable: Cell ({}, {}) overflows (target={}, R={}), table is empty",
                        w, r, target, risk_reward_ratio
                    );
                    return Self::empty();
                };

                cells[w * width + r] = required.map(ceil_cents);
            }
        }

        let table = Self {
            target_balance: target,
            required_wins,
            total_trades,
            cells,
        };

        debug!(
            "RequiredBalanceTable: Built {}x{} table, target={}, start requirement={:?}",
            rows,
            width,
            target,
            table.starting_requirement()
        );

        table
    }

    /// Requirement of one cell from its loss and win successors
    fn requirement(
        loss_req: Option<Decimal>,
        win_req: Option<Decimal>,
        risk_reward_ratio: Decimal,
        divisor: Decimal,
    ) -> Result<Option<Decimal>, CellOverflow> {
        match (loss_req, win_req) {
            (None, Some(win)) => win.checked_div(divisor).map(Some).ok_or(CellOverflow),
            (None, None) => Ok(None),
            (Some(loss), Some(win)) => risk_reward_ratio
                .checked_mul(loss)
                .and_then(|weighted| weighted.checked_add(win))
                .and_then(|sum| sum.checked_div(divisor))
                .map(|hedged| Some(loss.max(hedged)))
                .ok_or(CellOverflow),
            // A finite loss branch implies r-1 >= w, so the win row is finite too
            (Some(loss), None) => Ok(Some(loss)),
        }
    }

    /// A table with no cells. Every lookup is unreachable.
    pub fn empty() -> Self {
        Self {
            target_balance: Decimal::ZERO,
            required_wins: 0,
            total_trades: 0,
            cells: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `(wins_needed, remaining_trades)` lies inside the table
    pub fn contains(&self, wins_needed: u32, remaining_trades: u32) -> bool {
        !self.is_empty()
            && wins_needed <= self.required_wins
            && remaining_trades <= self.total_trades
    }

    /// Exact cell lookup. `None` means unreachable or out of bounds.
    pub fn get(&self, wins_needed: u32, remaining_trades: u32) -> Option<Decimal> {
        if !self.contains(wins_needed, remaining_trades) {
            return None;
        }
        self.cells[self.index(wins_needed, remaining_trades)]
    }

    /// Balance required at the start of the session, `req[W][N]`
    pub fn starting_requirement(&self) -> Option<Decimal> {
        self.get(self.required_wins, self.total_trades)
    }

    /// Whether a session starting from `capital` can be planned to the target
    pub fn is_feasible_from(&self, capital: Decimal) -> bool {
        self.starting_requirement()
            .is_some_and(|required| capital >= required)
    }

    pub fn target_balance(&self) -> Decimal {
        self.target_balance
    }

    pub fn required_wins(&self) -> u32 {
        self.required_wins
    }

    pub fn total_trades(&self) -> u32 {
        self.total_trades
    }

    /// Rows indexed by wins needed; each row is indexed by trades remaining
    pub fn rows(&self) -> impl Iterator<Item = &[Option<Decimal>]> {
        let width = self.width();
        self.cells.chunks(width.max(1))
    }

    fn width(&self) -> usize {
        self.total_trades as usize + 1
    }

    fn index(&self, wins_needed: u32, remaining_trades: u32) -> usize {
        wins_needed as usize * self.width() + remaining_trades as usize
    }
}
