use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stakeplan::domain::config::PlannerConfig;
use stakeplan::domain::planning::{
    OutcomeRecorder, RequiredBalanceTable, StakePlanner, TargetProfitCalculator, replay,
};
use stakeplan::domain::session::{PlanningSession, SessionParameters, SessionStatus, TradeOutcome};

struct Run {
    final_balance: Decimal,
    trades_taken: u32,
}

fn outcome_at(bits: u32, i: u32) -> TradeOutcome {
    if bits & (1 << i) != 0 {
        TradeOutcome::Won
    } else {
        TradeOutcome::Lost
    }
}

/// Follow the planner's stakes through one outcome sequence, checking the
/// per-step invariants along the way
fn run_sequence(params: &SessionParameters, table: &RequiredBalanceTable, bits: u32) -> Run {
    let required_wins = params.required_wins();
    let mut balance = params.capital;
    let mut wins = 0;
    let mut completed = 0;

    while completed < params.total_trades && wins < required_wins {
        let remaining = params.total_trades - completed;
        let wins_needed = required_wins - wins;

        if let Some(required) = table.get(wins_needed, remaining) {
            assert!(
                balance >= required,
                "balance {} below requirement {} at (w={}, r={}) for {:?} bits={:b}",
                balance,
                required,
                wins_needed,
                remaining,
                params,
                bits
            );
        }

        let stake = StakePlanner::next_stake(
            balance,
            remaining,
            wins_needed,
            params.risk_reward_ratio,
            table,
        );
        assert!(stake <= balance, "stake {} exceeds balance {}", stake, balance);
        if remaining >= wins_needed {
            assert!(stake > Decimal::ZERO, "planner stalled on a reachable state");
        }
        if stake <= Decimal::ZERO {
            break;
        }

        let outcome = outcome_at(bits, completed);
        if outcome == TradeOutcome::Won {
            wins += 1;
        }
        let result = OutcomeRecorder::evaluate(stake, params.risk_reward_ratio, outcome).unwrap();
        balance += result.profit_or_loss;
        assert!(balance >= Decimal::ZERO);
        completed += 1;
    }

    Run {
        final_balance: balance,
        trades_taken: completed,
    }
}

fn assert_feasible_for_all_sequences(params: SessionParameters) {
    let config = PlannerConfig::default();
    let target_profit = TargetProfitCalculator::new(&config).compute(&params);
    assert!(target_profit > Decimal::ZERO, "no target for {:?}", params);

    let table = PlanningSession::build_table(&params, target_profit);
    let target_balance = params.capital + target_profit;
    assert!(
        table.is_feasible_from(params.capital),
        "capital {} below starting requirement {:?}",
        params.capital,
        table.starting_requirement()
    );

    let required_wins = params.required_wins();
    for bits in 0..(1u32 << params.total_trades) {
        let run = run_sequence(&params, &table, bits);
        let wins_in_sequence = (0..params.total_trades)
            .filter(|&i| outcome_at(bits, i) == TradeOutcome::Won)
            .count() as u32;

        if wins_in_sequence >= required_wins {
            assert!(
                run.final_balance >= target_balance,
                "shortfall {} for {:?} bits={:b} after {} trades",
                target_balance - run.final_balance,
                params,
                bits,
                run.trades_taken
            );
        }
    }
}

#[test]
fn test_reference_session_never_falls_short() {
    assert_feasible_for_all_sequences(SessionParameters::new(dec!(1000), 10, dec!(50), dec!(3)));
}

#[test]
fn test_even_payoff_never_falls_short() {
    assert_feasible_for_all_sequences(SessionParameters::new(dec!(1000), 10, dec!(50), dec!(1)));
}

#[test]
fn test_fractional_payoff_never_falls_short() {
    assert_feasible_for_all_sequences(SessionParameters::new(dec!(250), 4, dec!(75), dec!(1.5)));
    assert_feasible_for_all_sequences(SessionParameters::new(
        dec!(777.77),
        9,
        dec!(44.4),
        dec!(1.37),
    ));
}

#[test]
fn test_longer_sessions_never_fall_short() {
    assert_feasible_for_all_sequences(SessionParameters::new(dec!(1000), 12, dec!(50), dec!(2)));
    assert_feasible_for_all_sequences(SessionParameters::new(dec!(1000), 14, dec!(60), dec!(4)));
}

#[test]
fn test_replay_matches_pure_planner() {
    let params = SessionParameters::new(dec!(1000), 10, dec!(50), dec!(3));
    let config = PlannerConfig::default();
    let target_profit = TargetProfitCalculator::new(&config).compute(&params);
    let table = PlanningSession::build_table(&params, target_profit);

    for bits in [0b0000011111u32, 0b1111100000, 0b1010101010, 0b0000000000, 0b1111111111] {
        let outcomes: Vec<TradeOutcome> =
            (0..params.total_trades).map(|i| outcome_at(bits, i)).collect();
        let replayed = replay(params, &config, &outcomes).unwrap();
        let pure = run_sequence(&params, &table, bits);

        assert_eq!(replayed.final_balance, pure.final_balance, "bits={:b}", bits);
        assert_eq!(replayed.steps.len() as u32, pure.trades_taken);
    }
}

#[test]
fn test_all_losses_exhaust_the_session() {
    let params = SessionParameters::new(dec!(1000), 10, dec!(50), dec!(3));
    let outcomes = vec![TradeOutcome::Lost; 10];
    let result = replay(params, &PlannerConfig::default(), &outcomes).unwrap();

    assert!(!result.target_reached());
    assert!(result.final_balance < dec!(1000));
    assert!(result.final_balance >= Decimal::ZERO);
    assert_ne!(result.status, SessionStatus::WinsReached);
}
