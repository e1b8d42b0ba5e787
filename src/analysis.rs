use crate::api::football::{
    all_fixture_files, fixture_files, fixture_names, load_fixtures, load_match_odds,
    load_match_results, load_standings, load_team_statistics, odds_files, standings_files,
    statistics_files,
};
use crate::api::FixtureRow;
use crate::config::{DataPaths, Settings};
use crate::models::{MatchPrediction, ValueBet};
use crate::utils::data::{load_predictions, load_value_bets, save_value_bets};
use crate::utils::dataset::{merge_fixtures, save_base_matches};
use crate::utils::evaluation::{evaluate_bets, save_evaluations, BetEvaluation};
use crate::utils::rankings::{
    load_rankings, rankings_from_standings, rankings_from_statistics, save_rankings, team_form,
    Rankings, TeamRanking,
};
use crate::utils::strategies::{predict_fixtures, Strategy};
use crate::utils::value_bets::calculate_value_bets;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Where match probabilities come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbabilitySource {
    /// Ratio of the two teams' rankings
    #[default]
    Rankings,
    /// Recent goal difference plus rankings
    Form,
    /// Fixed prior for ranked teams
    Prior,
    /// External model output in `lstm/predictions_today.csv`
    Model,
}

impl ProbabilitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbabilitySource::Rankings => "rankings",
            ProbabilitySource::Form => "form",
            ProbabilitySource::Prior => "prior",
            ProbabilitySource::Model => "model",
        }
    }
}

impl fmt::Display for ProbabilitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProbabilitySource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rankings" | "ranking" => Ok(ProbabilitySource::Rankings),
            "form" => Ok(ProbabilitySource::Form),
            "prior" => Ok(ProbabilitySource::Prior),
            "model" | "lstm" => Ok(ProbabilitySource::Model),
            other => bail!("Unknown probability source: {}", other),
        }
    }
}

/// Input used to build `rankings.csv`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingInput {
    #[default]
    Statistics,
    Standings,
}

impl FromStr for RankingInput {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "statistics" | "stats" => Ok(RankingInput::Statistics),
            "standings" => Ok(RankingInput::Standings),
            other => bail!("Unknown ranking input: {}", other),
        }
    }
}

/// Result of analysing one day
#[derive(Debug, Clone)]
pub struct DailyAnalysis {
    pub date: NaiveDate,
    pub source: ProbabilitySource,
    pub fixtures: usize,
    pub predictions: usize,
    pub matches_with_odds: usize,
    pub value_bets: Vec<ValueBet>,
}

/// Merge every saved fixture file into `processed/base_matches.csv`
pub fn merge_dataset(paths: &DataPaths) -> Result<Vec<FixtureRow>> {
    let files = all_fixture_files(&paths.raw_dir())?;
    if files.is_empty() {
        warn!("No fixture files in {}", paths.raw_dir().display());
    }
    let rows = merge_fixtures(&files);
    save_base_matches(&rows, &paths.base_matches())?;
    info!("{} matches written to {}", rows.len(), paths.base_matches().display());
    Ok(rows)
}

/// Compute rankings from saved statistics or standings and write `rankings.csv`
pub fn build_rankings(paths: &DataPaths, input: RankingInput) -> Result<Vec<TeamRanking>> {
    let raw = paths.raw_dir();
    let rows = match input {
        RankingInput::Statistics => {
            let files = statistics_files(&raw)?;
            rankings_from_statistics(&load_team_statistics(&files))
        }
        RankingInput::Standings => {
            let files = standings_files(&raw)?;
            rankings_from_standings(&load_standings(&files))
        }
    };
    if rows.is_empty() {
        bail!("No team data found to build rankings from {}", raw.display());
    }
    save_rankings(&rows, &paths.rankings())?;
    info!("{} teams ranked", rows.len());
    Ok(rows)
}

/// Rankings used by the ranking-based sources; a missing file is an error
fn require_rankings(paths: &DataPaths) -> Result<Rankings> {
    let path = paths.rankings();
    if !path.exists() {
        bail!(
            "Rankings file not found at {}; run the rankings command first",
            path.display()
        );
    }
    load_rankings(&path).with_context(|| format!("Failed to read rankings {}", path.display()))
}

/// Probabilities for `fixtures` from the chosen source
pub fn predictions_for(
    paths: &DataPaths,
    source: ProbabilitySource,
    fixtures: &[FixtureRow],
) -> Result<Vec<MatchPrediction>> {
    match source {
        ProbabilitySource::Model => {
            let path = paths.model_predictions();
            load_predictions(&path)
                .with_context(|| format!("Model predictions not found at {}", path.display()))
        }
        ProbabilitySource::Rankings => {
            let rankings = require_rankings(paths)?;
            Ok(predict_fixtures(&Strategy::RankingRatio(&rankings), fixtures))
        }
        ProbabilitySource::Prior => {
            let rankings = require_rankings(paths)?;
            Ok(predict_fixtures(&Strategy::FixedPrior(&rankings), fixtures))
        }
        ProbabilitySource::Form => {
            let rankings = require_rankings(paths)?;
            let stats = load_team_statistics(&statistics_files(&paths.raw_dir())?);
            let form = team_form(&stats);
            Ok(predict_fixtures(
                &Strategy::GoalForm {
                    form: &form,
                    rankings: &rankings,
                },
                fixtures,
            ))
        }
    }
}

/// Find the value bets of `date` from its saved fixtures and odds
pub fn analyse_day(
    settings: &Settings,
    date: NaiveDate,
    source: ProbabilitySource,
    threshold: f64,
) -> Result<DailyAnalysis> {
    let paths = settings.paths();
    let raw = paths.raw_dir();

    let fixtures = load_fixtures(&fixture_files(&raw, date)?);
    let names = fixture_names(&fixtures);
    let odds = load_match_odds(&odds_files(&raw, date)?, &settings.bookmaker, &names);
    info!(
        "{}: {} fixtures, {} with {} odds",
        date,
        fixtures.len(),
        odds.len(),
        settings.bookmaker
    );

    let predictions = predictions_for(&paths, source, &fixtures)?;
    let value_bets = calculate_value_bets(&predictions, &odds, threshold);

    Ok(DailyAnalysis {
        date,
        source,
        fixtures: fixtures.len(),
        predictions: predictions.len(),
        matches_with_odds: odds.len(),
        value_bets,
    })
}

/// Write `bets_today.csv` and the dated `bets_<date>.csv` snapshot
pub fn save_daily_bets(paths: &DataPaths, date: NaiveDate, bets: &[ValueBet]) -> Result<()> {
    save_value_bets(bets, &paths.bets_today())?;
    save_value_bets(bets, &paths.bets_for(date))?;
    info!("{} value bets saved for {}", bets.len(), date);
    Ok(())
}

/// Evaluate the `bets_<date>.csv` slip at unit stakes and write `bets_results_<date>.csv`
///
/// Returns `None` when no slip was saved for that day.
pub fn evaluate_day(paths: &DataPaths, date: NaiveDate) -> Result<Option<Vec<BetEvaluation>>> {
    let slip = paths.bets_for(date);
    if !slip.exists() {
        warn!("No bets saved for {}", date);
        return Ok(None);
    }
    let bets = load_value_bets(&slip)?;
    let results = load_match_results(&fixture_files(&paths.raw_dir(), date)?);
    let evaluations = evaluate_bets(&bets, &results);
    if !evaluations.is_empty() {
        save_evaluations(&evaluations, &paths.bet_results_for(date))?;
    }
    Ok(Some(evaluations))
}
