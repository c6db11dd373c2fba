//! Stake Planner CLI
//!
//! Computes target profits, prints required-balance tables, replays outcome
//! sequences through the planner and runs Monte Carlo evaluations.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use stakeplan::application::PlanningService;
use stakeplan::config::{Config, SessionFile};
use stakeplan::domain::planning::{
    AlignmentReport, MonteCarloConfig, MonteCarloPlanner, ReplayResult, replay,
};
use stakeplan::domain::session::{PlanningSession, SessionParameters, SessionProgress, TradeOutcome};
use stakeplan::infrastructure::{InMemorySessionRepository, InMemoryTradeRepository};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Stake planning and profit alignment", long_about = None)]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ParamsArgs {
    /// TOML file with session parameters (overrides the flags below)
    #[arg(long)]
    session: Option<PathBuf>,

    /// Starting capital
    #[arg(long)]
    capital: Option<Decimal>,

    /// Planned number of trades
    #[arg(long)]
    trades: Option<u32>,

    /// Target accuracy percentage (0-100)
    #[arg(long)]
    accuracy: Option<Decimal>,

    /// Risk:reward ratio (a win pays this multiple of the stake)
    #[arg(long)]
    risk_reward: Option<Decimal>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the target profit and starting requirement of a session
    Target {
        #[command(flatten)]
        params: ParamsArgs,
    },
    /// Export the required-balance table as CSV
    Table {
        #[command(flatten)]
        params: ParamsArgs,

        /// Output CSV file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay a win/loss sequence such as WLWWL through the planner
    Replay {
        #[command(flatten)]
        params: ParamsArgs,

        /// Outcome sequence, one W or L per trade
        #[arg(long)]
        outcomes: String,
    },
    /// Drive a full session through the planning service, then align profit
    Session {
        #[command(flatten)]
        params: ParamsArgs,

        /// Outcome sequence, one W or L per trade
        #[arg(long)]
        outcomes: String,
    },
    /// Estimate the plan's outcome distribution under random results
    MonteCarlo {
        #[command(flatten)]
        params: ParamsArgs,

        /// Probability that a single trade wins (defaults to the session accuracy)
        #[arg(long)]
        win_rate: Option<f64>,

        /// Number of simulated sessions (defaults to MONTE_CARLO_ITERATIONS)
        #[arg(short, long)]
        iterations: Option<usize>,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Serialize)]
struct TargetSummary {
    parameters: SessionParameters,
    required_wins: u32,
    target_profit: Decimal,
    target_balance: Decimal,
    starting_requirement: Option<Decimal>,
    feasible: bool,
}

#[derive(Serialize)]
struct SessionSummary {
    progress: SessionProgress,
    alignment: Option<AlignmentReport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays parseable
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Target { params } => {
            let params = resolve_params(&params)?;
            let session = PlanningSession::new(params, &config.planner);
            let summary = TargetSummary {
                parameters: params,
                required_wins: session.required_wins(),
                target_profit: session.target_profit(),
                target_balance: session.target_balance(),
                starting_requirement: session.table().starting_requirement(),
                feasible: session.table().is_feasible_from(params.capital),
            };

            if cli.json {
                print_json(&summary)?;
            } else {
                println!("{}", "=".repeat(60));
                println!("Capital:              ${}", params.capital);
                println!("Trades / accuracy:    {} @ {}%", params.total_trades, params.accuracy);
                println!("Risk:reward:          {}", params.risk_reward_ratio);
                println!("Required wins:        {}", summary.required_wins);
                println!("Target profit:        ${}", summary.target_profit);
                println!("Target balance:       ${}", summary.target_balance);
                match summary.starting_requirement {
                    Some(required) => println!("Starting requirement: ${}", required),
                    None => println!("Starting requirement: unreachable"),
                }
                println!(
                    "Feasible:             {}",
                    if summary.feasible { "yes" } else { "no" }
                );
                println!("{}", "=".repeat(60));
            }
        }
        Commands::Table { params, output } => {
            let params = resolve_params(&params)?;
            let session = PlanningSession::new(params, &config.planner);
            match output {
                Some(path) => {
                    let writer = csv::Writer::from_path(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    write_table(writer, &session)?;
                    info!("Wrote required-balance table to {}", path.display());
                }
                None => write_table(csv::Writer::from_writer(io::stdout()), &session)?,
            }
        }
        Commands::Replay { params, outcomes } => {
            let params = resolve_params(&params)?;
            let outcomes = parse_outcomes(&outcomes)?;
            let result = replay(params, &config.planner, &outcomes)?;

            if cli.json {
                print_json(&result)?;
            } else {
                print_replay(&result);
            }
        }
        Commands::Session { params, outcomes } => {
            let params = resolve_params(&params)?;
            let outcomes = parse_outcomes(&outcomes)?;
            let summary = run_session(&config, params, &outcomes).await?;

            if cli.json {
                print_json(&summary)?;
            } else {
                print_session(&summary);
            }
        }
        Commands::MonteCarlo {
            params,
            win_rate,
            iterations,
            seed,
        } => {
            let params = resolve_params(&params)?;
            let win_rate = match win_rate {
                Some(rate) => rate,
                None => rust_decimal::prelude::ToPrimitive::to_f64(&params.accuracy)
                    .map(|pct| pct / 100.0)
                    .unwrap_or(0.5),
            };
            if !(0.0..=1.0).contains(&win_rate) {
                bail!("Win rate must be between 0 and 1, got {}", win_rate);
            }

            let mc_config = MonteCarloConfig {
                iterations: iterations.unwrap_or(config.monte_carlo_iterations),
                win_rate,
                seed,
            };
            let result = MonteCarloPlanner::simulate(&params, &config.planner, &mc_config);

            if cli.json {
                print_json(&result)?;
            } else {
                println!("{}", "=".repeat(60));
                println!("Runs:                 {}", result.iterations);
                println!("Win rate:             {:.2}", win_rate);
                println!("Target balance:       ${}", result.target_balance);
                println!(
                    "P(target reached):    {:.1}%",
                    result.probability_target_reached * 100.0
                );
                println!(
                    "P(wins reached):      {:.1}%",
                    result.probability_wins_reached * 100.0
                );
                println!("P(profit):            {:.1}%", result.probability_of_profit * 100.0);
                println!("Mean final balance:   ${}", result.final_balance_mean);
                println!("Median final balance: ${}", result.final_balance_median);
                println!(
                    "5th / 95th pct:       ${} / ${}",
                    result.percentile_5, result.percentile_95
                );
                println!("{}", "=".repeat(60));
            }
        }
    }

    Ok(())
}

fn resolve_params(args: &ParamsArgs) -> Result<SessionParameters> {
    if let Some(path) = &args.session {
        return SessionFile::load(path);
    }

    let (Some(capital), Some(trades), Some(accuracy), Some(risk_reward)) =
        (args.capital, args.trades, args.accuracy, args.risk_reward)
    else {
        bail!("Provide --session FILE or all of --capital, --trades, --accuracy, --risk-reward");
    };

    let params = SessionParameters::new(capital, trades, accuracy, risk_reward);
    params.validate()?;
    Ok(params)
}

fn parse_outcomes(pattern: &str) -> Result<Vec<TradeOutcome>> {
    pattern
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(TradeOutcome::try_from)
        .collect()
}

async fn run_session(
    config: &Config,
    params: SessionParameters,
    outcomes: &[TradeOutcome],
) -> Result<SessionSummary> {
    let service = PlanningService::new(
        config.planner.clone(),
        Arc::new(InMemorySessionRepository::new()),
        Arc::new(InMemoryTradeRepository::new()),
    );

    let session_id = service.open_session(params).await?.session_id;
    for &outcome in outcomes {
        let Some(trade) = service.plan_next(session_id).await? else {
            break;
        };
        service.record(session_id, trade.id, outcome).await?;
    }

    let progress = service.progress(session_id).await?;
    let alignment = if progress.completed_trades > 0 {
        Some(service.reconcile(session_id).await?)
    } else {
        None
    };

    Ok(SessionSummary {
        progress: service.progress(session_id).await?,
        alignment,
    })
}

fn write_table<W: io::Write>(mut writer: csv::Writer<W>, session: &PlanningSession) -> Result<()> {
    let table = session.table();
    let mut header = vec!["wins_needed".to_string()];
    header.extend((0..=table.total_trades()).map(|r| format!("r{}", r)));
    writer.write_record(&header)?;

    for (wins_needed, row) in table.rows().enumerate() {
        let mut record = vec![wins_needed.to_string()];
        record.extend(row.iter().map(|cell| match cell {
            Some(required) => required.to_string(),
            None => "inf".to_string(),
        }));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_replay(result: &ReplayResult) {
    println!("{}", "=".repeat(80));
    println!(
        "{:>4} {:>12} {:>12} {:>6} {:>12} {:>12} {:>6}",
        "#", "Balance", "Stake", "Result", "P&L", "After", "Need"
    );
    println!("{}", "-".repeat(80));
    for step in &result.steps {
        println!(
            "{:>4} {:>12} {:>12} {:>6} {:>12} {:>12} {:>6}",
            step.sequence,
            step.balance_before,
            step.stake,
            step.outcome.to_string(),
            step.profit_or_loss,
            step.balance_after,
            step.wins_needed_after
        );
    }
    println!("{}", "-".repeat(80));
    println!(
        "Final balance ${} vs target ${} ({:?}){}",
        result.final_balance,
        result.target_balance,
        result.status,
        if result.target_reached() { ", target reached" } else { "" }
    );
    if result.unused_outcomes > 0 {
        println!("{} outcome(s) unused", result.unused_outcomes);
    }
    println!("{}", "=".repeat(80));
}

fn print_session(summary: &SessionSummary) {
    let progress = &summary.progress;
    println!("{}", "=".repeat(60));
    println!("Session:              {}", progress.session_id);
    println!("Status:               {:?}", progress.status);
    println!(
        "Wins / trades:        {} / {} ({} remaining)",
        progress.wins, progress.completed_trades, progress.remaining_trades
    );
    println!("Balance:              ${}", progress.current_balance);
    println!(
        "Realized profit:      ${} of ${} ({}%)",
        progress.realized_profit, progress.target_profit, progress.target_progress_pct
    );
    if let Some(report) = &summary.alignment {
        println!(
            "Alignment:            {:?} after {} pass(es), residual ${}",
            report.status,
            report.passes,
            report.residual()
        );
    }
    println!("{}", "=".repeat(60));
}
