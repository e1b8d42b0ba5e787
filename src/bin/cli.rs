use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use football_value_bets::analysis::{
    analyse_day, build_rankings, evaluate_day, merge_dataset, save_daily_bets, ProbabilitySource,
    RankingInput,
};
use football_value_bets::backtest::kelly_backtest;
use football_value_bets::evaluation::total_roi;
use football_value_bets::value_bets::summarize;
use football_value_bets::{
    create_demo_history, run_daily, AddBetsOutcome, BettingTracker, DailyOptions, SettleOutcome,
    Settings, Staking,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Football value bets and bankroll tracker", long_about = None)]
struct Cli {
    /// Data directory (overrides BETTING_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge saved fixture files into processed/base_matches.csv
    Merge,
    /// Build rankings.csv from team statistics or standings
    Rankings {
        #[arg(long, default_value = "statistics")]
        from: RankingInput,
    },
    /// Find today's value bets and write bets_today.csv
    Analyse {
        #[arg(long, default_value = "rankings")]
        source: ProbabilitySource,
        /// Minimum expected value (overrides VALUE_THRESHOLD)
        #[arg(long)]
        threshold: Option<f64>,
        /// Day to analyse (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Record bets_today.csv in the betting history
    AddBets {
        /// Flat stake multiplier
        #[arg(long, default_value_t = 1.0)]
        multiplier: f64,
        /// Stake this fraction of the Kelly amount instead of a flat bet
        #[arg(long, conflicts_with = "multiplier")]
        kelly: Option<f64>,
    },
    /// Settle pending bets from saved fixture results
    Settle {
        /// Day to settle (defaults to yesterday)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Grade a day's bet slip at unit stakes
    Evaluate {
        /// Day to evaluate (defaults to yesterday)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show global statistics
    Stats,
    /// Show statistics per league
    Leagues,
    /// List the betting history
    History {
        /// Only pending bets
        #[arg(long)]
        pending: bool,
    },
    /// Replay the settled history with Kelly staking
    Backtest {
        #[arg(long, default_value_t = 0.25)]
        fraction: f64,
    },
    /// Replace the history with generated demo data
    Demo {
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(1..=3650))]
        days: i64,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Settle yesterday, analyse today and print a report
    Daily {
        #[arg(long, default_value = "rankings")]
        source: ProbabilitySource,
        /// Record today's value bets without asking
        #[arg(long)]
        auto_add: bool,
        #[arg(long, default_value_t = 1.0)]
        multiplier: f64,
    },
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env().context("Failed to load settings")?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }

    let today = Local::now().date_naive();
    let yesterday = today - Duration::days(1);
    let paths = settings.paths();

    match cli.command {
        Commands::Merge => {
            let rows = merge_dataset(&paths)?;
            println!(
                "{} matches saved to {}",
                rows.len(),
                paths.base_matches().display()
            );
        }
        Commands::Rankings { from } => {
            let rows = build_rankings(&paths, from)?;
            println!("Top {} teams:\n", rows.len().min(10));
            for (i, row) in rows.iter().take(10).enumerate() {
                println!("{}. {} ({:.1})", i + 1, row.team, row.score);
            }
            println!(
                "\nSaved {} rankings to {}",
                rows.len(),
                paths.rankings().display()
            );
        }
        Commands::Analyse {
            source,
            threshold,
            date,
        } => {
            let date = date.unwrap_or(today);
            let threshold = threshold.unwrap_or(settings.value_threshold);
            let analysis = analyse_day(&settings, date, source, threshold)?;
            save_daily_bets(&paths, date, &analysis.value_bets)?;

            println!(
                "{}: {} fixtures, {} predictions ({}), {} with odds\n",
                date, analysis.fixtures, analysis.predictions, source, analysis.matches_with_odds
            );
            if analysis.value_bets.is_empty() {
                println!("No value bets found.");
            } else {
                println!("Top {} Value Bets:\n", analysis.value_bets.len());
                for (i, bet) in analysis.value_bets.iter().enumerate() {
                    println!("{}. {}", i + 1, bet.format());
                }
                let summary = summarize(&analysis.value_bets);
                println!("\nTotal EV:     {:+.1}%", summary.total_expected_value * 100.0);
                println!("Average odds: {:.2}", summary.average_odds);
                println!("Average edge: {:+.1}%", summary.average_edge);
            }
            println!("\nSaved bets to {}", paths.bets_today().display());
        }
        Commands::AddBets { multiplier, kelly } => {
            let tracker = BettingTracker::from_settings(&settings)?;
            let staking = match kelly {
                Some(fraction) => Staking::Kelly { fraction },
                None => Staking::Flat { multiplier },
            };
            match tracker.add_todays_bets_from_files(today, staking)? {
                AddBetsOutcome::Added(n) => println!("{} bets added to the history", n),
                AddBetsOutcome::AlreadyRecorded => {
                    println!("Bets for {} are already in the history", today)
                }
                AddBetsOutcome::NoBetsFile => {
                    println!("No bets file found at {}", paths.bets_today().display())
                }
                AddBetsOutcome::NoValueBets => println!("No value bets to add"),
            }
        }
        Commands::Settle { date } => {
            let tracker = BettingTracker::from_settings(&settings)?;
            let date = date.unwrap_or(yesterday);
            match tracker.update_results_from_files(date)? {
                SettleOutcome::Settled {
                    updated,
                    current_bankroll,
                } => {
                    println!("{} bets settled for {}", updated, date);
                    println!("Current bankroll: {:.2}", current_bankroll);
                }
                SettleOutcome::NoHistory => println!("No betting history found"),
                SettleOutcome::NothingPending => println!("No pending bets for {}", date),
            }
        }
        Commands::Evaluate { date } => {
            let date = date.unwrap_or(yesterday);
            match evaluate_day(&paths, date)? {
                None => println!("No bets saved for {}", date),
                Some(evaluations) if evaluations.is_empty() => {
                    println!("No finished matches found for the bets of {}", date)
                }
                Some(evaluations) => {
                    println!("Results for the bets of {}:\n", date);
                    for (i, evaluation) in evaluations.iter().enumerate() {
                        println!("{}. {}", i + 1, evaluation.format());
                    }
                    println!("\nTotal ROI: {:+.2}", total_roi(&evaluations));
                    println!("Saved to {}", paths.bet_results_for(date).display());
                }
            }
        }
        Commands::Stats => {
            let tracker = BettingTracker::from_settings(&settings)?;
            let stats = tracker.statistics()?;
            println!(
                "Bankroll:     {:.2} (start {:.2})",
                stats.current_bankroll, stats.initial_bankroll
            );
            println!("Profit/Loss:  {:+.2}", stats.profit_loss);
            println!(
                "Win rate:     {:.1}% ({}/{})",
                stats.win_rate, stats.winning_bets, stats.total_bets
            );
            println!("ROI:          {:+.1}%", stats.roi_percentage);
            println!("Average odds: {:.2}", stats.avg_odds);
            println!("Pending bets: {}", stats.pending_bets);
        }
        Commands::Leagues => {
            let tracker = BettingTracker::from_settings(&settings)?;
            let leagues = tracker.league_statistics()?;
            if leagues.is_empty() {
                println!("No settled bets yet.");
            }
            for (i, league) in leagues.iter().enumerate() {
                println!(
                    "{}. {}: {:+.2} | {} bets, {:.1}% won | avg odds {:.2} | avg EV {:+.3}",
                    i + 1,
                    league.league,
                    league.total_roi,
                    league.total_bets,
                    league.win_rate,
                    league.avg_odds,
                    league.avg_expected_value
                );
            }
        }
        Commands::History { pending } => {
            let tracker = BettingTracker::from_settings(&settings)?;
            let rows: Vec<_> = tracker
                .history()?
                .into_iter()
                .filter(|row| !pending || row.is_pending())
                .collect();
            if rows.is_empty() {
                println!("No bets recorded.");
            }
            for row in &rows {
                println!("{}", row.format());
            }
        }
        Commands::Backtest { fraction } => {
            let tracker = BettingTracker::from_settings(&settings)?;
            let config = tracker.config()?;
            let result = kelly_backtest(&tracker.history()?, config.initial_bankroll, fraction);
            println!("Kelly backtest (fraction {:.2})\n", fraction);
            println!(
                "Bets placed:    {} ({} won, {} skipped)",
                result.bets_placed, result.wins, result.bets_skipped
            );
            println!(
                "Final bankroll: {:.2} ({:+.1}%)",
                result.final_bankroll,
                result.roi_percentage()
            );
            println!("Peak bankroll:  {:.2}", result.peak_bankroll);
            println!("Max drawdown:   {:.1}%", result.max_drawdown * 100.0);
            println!("Losing streak:  {}", result.max_consecutive_losses);
            println!(
                "Flat stakes:    {:.2} ({:+.1}%)",
                result.flat_final_bankroll,
                result.flat_roi_percentage()
            );
        }
        Commands::Demo { days, seed } => {
            let tracker = BettingTracker::from_settings(&settings)?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let summary = create_demo_history(&tracker, &mut rng, days, today)?;
            println!("Demo history created:");
            println!("  {} bets over {} days", summary.total_bets, summary.days);
            println!(
                "  {} winning bets ({:.1}%)",
                summary.winning_bets,
                summary.win_rate()
            );
            println!("  Final bankroll: {:.2}", summary.final_bankroll);
            println!("  ROI: {:+.1}%", summary.roi_percentage());
        }
        Commands::Daily {
            source,
            auto_add,
            multiplier,
        } => {
            let tracker = BettingTracker::from_settings(&settings)?;
            let run = run_daily(
                &settings,
                &tracker,
                today,
                DailyOptions {
                    source,
                    threshold: settings.value_threshold,
                    auto_add,
                    multiplier,
                },
            )?;

            match run.settled {
                Some(SettleOutcome::Settled { updated, .. }) => {
                    println!("{} bets settled for {}", updated, run.yesterday)
                }
                _ => println!("No pending bets for {}", run.yesterday),
            }
            match (&run.analysis, &run.analysis_error) {
                (Some(analysis), _) => {
                    println!("{} value bets found for {}", analysis.value_bets.len(), today);
                    for (i, bet) in analysis.value_bets.iter().enumerate() {
                        println!("{}. {}", i + 1, bet.format());
                    }
                }
                (None, Some(error)) => eprintln!("Analysis failed: {}", error),
                (None, None) => {}
            }
            match run.added {
                Some(AddBetsOutcome::Added(n)) => println!("{} bets added to the history", n),
                Some(AddBetsOutcome::AlreadyRecorded) => {
                    println!("Today's bets were already recorded")
                }
                Some(_) => println!("No value bets to add"),
                None if !auto_add => println!("Bets not recorded; run add-bets to record them"),
                None => {}
            }
            println!("\n{}", run.report.format());
        }
    }

    Ok(())
}
