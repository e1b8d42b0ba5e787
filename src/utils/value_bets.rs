use crate::models::{MatchOdds, MatchPrediction, Outcome, ValueBet};
use crate::utils::ev_calculator::{edge_percent, expected_value, implied_probability, round_to};
use std::collections::HashMap;
use tracing::warn;

/// Compare predictions against bookmaker odds and keep bets whose EV beats `threshold`
///
/// Results are sorted by expected value, best first.
pub fn calculate_value_bets(
    predictions: &[MatchPrediction],
    odds: &HashMap<String, MatchOdds>,
    threshold: f64,
) -> Vec<ValueBet> {
    let mut value_bets = Vec::new();

    for prediction in predictions {
        let Some(match_odds) = odds.get(&prediction.match_name) else {
            warn!("Missing odds for: {}", prediction.match_name);
            continue;
        };
        let probabilities = prediction.probabilities();

        for outcome in Outcome::ALL {
            let predicted_prob = probabilities.get(outcome);
            let bookmaker_odds = match_odds.get(outcome);
            if bookmaker_odds <= 1.0 {
                continue;
            }

            let ev = expected_value(predicted_prob, bookmaker_odds);
            if ev > threshold {
                value_bets.push(ValueBet {
                    match_name: prediction.match_name.clone(),
                    bet_on: outcome,
                    bookmaker_odds,
                    expected_prob: round_to(predicted_prob, 3),
                    expected_value: round_to(ev, 3),
                    implied_odds_prob: round_to(implied_probability(bookmaker_odds), 3),
                    edge: round_to(edge_percent(predicted_prob, bookmaker_odds), 2),
                });
            }
        }
    }

    value_bets.sort_by(|a, b| {
        b.expected_value
            .partial_cmp(&a.expected_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    value_bets
}

/// Aggregate figures over a day's value bets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueBetSummary {
    pub count: usize,
    pub total_expected_value: f64,
    pub average_odds: f64,
    pub average_edge: f64,
}

pub fn summarize(bets: &[ValueBet]) -> ValueBetSummary {
    if bets.is_empty() {
        return ValueBetSummary {
            count: 0,
            total_expected_value: 0.0,
            average_odds: 0.0,
            average_edge: 0.0,
        };
    }
    let n = bets.len() as f64;
    ValueBetSummary {
        count: bets.len(),
        total_expected_value: bets.iter().map(|b| b.expected_value).sum(),
        average_odds: bets.iter().map(|b| b.bookmaker_odds).sum::<f64>() / n,
        average_edge: bets.iter().map(|b| b.edge).sum::<f64>() / n,
    }
}
