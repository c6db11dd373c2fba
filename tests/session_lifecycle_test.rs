use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stakeplan::domain::config::PlannerConfig;
use stakeplan::domain::errors::PlanningError;
use stakeplan::domain::planning::AlignmentStatus;
use stakeplan::domain::session::{
    PlanningSession, SessionParameters, SessionStatus, TradeOutcome, TradeStatus,
};

fn reference_params() -> SessionParameters {
    SessionParameters::new(dec!(1000), 10, dec!(50), dec!(3))
}

/// Plan and resolve trades for each outcome until the planner stops
fn drive(session: &mut PlanningSession, outcomes: &str) -> usize {
    let mut taken = 0;
    for c in outcomes.chars() {
        let outcome = TradeOutcome::try_from(c).unwrap();
        let Some(trade) = session.plan_next_trade().unwrap() else {
            break;
        };
        session.record_outcome(trade.id, outcome).unwrap();
        taken += 1;
    }
    taken
}

#[test]
fn test_full_session_reaches_target_and_aligns() {
    let mut session = PlanningSession::new(reference_params(), &PlannerConfig::default());
    assert_eq!(drive(&mut session, "LLWLWWLLWW"), 10);

    let progress = session.progress();
    assert_eq!(progress.status, SessionStatus::WinsReached);
    assert_eq!(progress.wins, 5);
    assert_eq!(progress.wins_needed, 0);
    assert!(progress.current_balance >= progress.target_balance);
    assert!(progress.target_progress_pct >= dec!(100));

    // Nothing more to plan once the wins are in
    assert_eq!(session.plan_next_trade().unwrap(), None);

    let report = session.align_profit().unwrap();
    assert!(report.is_reconciled());
    let progress = session.progress();
    assert!((progress.realized_profit - progress.target_profit).abs() < dec!(0.01));
    assert_eq!(progress.current_balance, dec!(1000) + progress.realized_profit);
    assert!(
        session
            .trades()
            .iter()
            .all(|t| t.status != TradeStatus::Pending)
    );
}

#[test]
fn test_session_exhausts_without_enough_wins() {
    let mut session = PlanningSession::new(reference_params(), &PlannerConfig::default());
    let taken = drive(&mut session, "LWLWLWLWLL");

    assert_eq!(taken, 10);
    let progress = session.progress();
    assert_eq!(progress.status, SessionStatus::TradesExhausted);
    assert_eq!(progress.remaining_trades, 0);
    assert_eq!(progress.wins_needed, 1);
    assert!(progress.current_balance < progress.target_balance);
    assert_eq!(session.plan_next_trade().unwrap(), None);
}

#[test]
fn test_wiped_out_session_stops_planning() {
    let mut session = PlanningSession::new(reference_params(), &PlannerConfig::default());
    // Five straight losses leave five wins needed from five trades: the sixth stake is all-in
    let taken = drive(&mut session, "LLLLLLWWWW");

    assert_eq!(taken, 6);
    assert_eq!(session.state().current_balance, Decimal::ZERO);
    assert_eq!(session.status(), SessionStatus::Active);
    assert_eq!(session.plan_next_trade().unwrap(), None);
}

#[test]
fn test_early_wins_finish_the_session() {
    let mut session = PlanningSession::new(reference_params(), &PlannerConfig::default());
    assert_eq!(drive(&mut session, "WWWWWWWWWW"), 5);
    assert_eq!(session.status(), SessionStatus::WinsReached);
    assert!(session.state().current_balance >= session.target_balance());
}

#[test]
fn test_sequences_are_strictly_increasing() {
    let mut session = PlanningSession::new(reference_params(), &PlannerConfig::default());
    drive(&mut session, "LWLWLW");
    let sequences: Vec<u32> = session.trades().iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_stakes_never_exceed_balance() {
    let mut session = PlanningSession::new(reference_params(), &PlannerConfig::default());
    for c in "LLLLLWLWWW".chars() {
        let balance = session.state().current_balance;
        let Some(trade) = session.plan_next_trade().unwrap() else {
            break;
        };
        assert!(trade.investment > Decimal::ZERO);
        assert!(trade.investment <= balance);
        session
            .record_outcome(trade.id, TradeOutcome::try_from(c).unwrap())
            .unwrap();
    }
}

#[test]
fn test_precondition_errors_leave_state_untouched() {
    let mut session = PlanningSession::new(reference_params(), &PlannerConfig::default());

    assert_eq!(
        session.align_profit().unwrap_err(),
        PlanningError::NoCompletedTrades
    );

    let trade = session.plan_next_trade().unwrap().unwrap();
    let before = session.progress();
    assert!(matches!(
        session.plan_next_trade(),
        Err(PlanningError::TradePending { .. })
    ));
    assert_eq!(session.progress(), before);

    session.record_outcome(trade.id, TradeOutcome::Won).unwrap();
    let after_record = session.progress();
    assert!(matches!(
        session.record_outcome(trade.id, TradeOutcome::Lost),
        Err(PlanningError::TradeNotPending { .. })
    ));
    assert_eq!(session.progress(), after_record);
}

#[test]
fn test_align_with_losses_only_uses_latest_trade() {
    let mut session = PlanningSession::new(reference_params(), &PlannerConfig::default());
    drive(&mut session, "LLL");

    let report = session.align_profit().unwrap();
    let last = session.trades().last().unwrap();
    assert_eq!(report.adjusted_trade, Some(last.id));
    assert_eq!(last.status, TradeStatus::Lost);
    // A loss cannot absorb a positive gap
    assert!(matches!(report.status, AlignmentStatus::Unreconciled { .. }));
}
