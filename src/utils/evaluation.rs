use crate::models::{Outcome, ValueBet};
use crate::utils::data::{write_csv, CsvRecord};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Outcome of a value bet at a one unit stake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetEvaluation {
    #[serde(rename = "match")]
    pub match_name: String,
    pub bet_on: Outcome,
    pub actual_result: Outcome,
    pub bookmaker_odds: f64,
    pub won: bool,
    /// Profit per unit staked
    pub roi: f64,
}

impl CsvRecord for BetEvaluation {
    const HEADERS: &'static [&'static str] = &[
        "match",
        "bet_on",
        "actual_result",
        "bookmaker_odds",
        "won",
        "roi",
    ];
}

impl BetEvaluation {
    pub fn format(&self) -> String {
        format!(
            "{} | Bet: {} | Result: {} | {} | ROI: {:+.2}",
            self.match_name,
            self.bet_on,
            self.actual_result,
            if self.won { "WON" } else { "LOST" },
            self.roi
        )
    }
}

/// Grade a slip of value bets; bets without a result are left out
pub fn evaluate_bets(
    bets: &[ValueBet],
    results: &HashMap<String, Outcome>,
) -> Vec<BetEvaluation> {
    bets.iter()
        .filter_map(|bet| {
            let actual = *results.get(&bet.match_name)?;
            let won = actual == bet.bet_on;
            Some(BetEvaluation {
                match_name: bet.match_name.clone(),
                bet_on: bet.bet_on,
                actual_result: actual,
                bookmaker_odds: bet.bookmaker_odds,
                won,
                roi: if won { bet.bookmaker_odds - 1.0 } else { -1.0 },
            })
        })
        .collect()
}

pub fn total_roi(evaluations: &[BetEvaluation]) -> f64 {
    evaluations.iter().map(|e| e.roi).sum()
}

pub fn save_evaluations(evaluations: &[BetEvaluation], path: &Path) -> Result<()> {
    write_csv(evaluations, path)
}
