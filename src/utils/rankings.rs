use crate::api::football::{ApiStanding, ApiTeamStatistics};
use crate::utils::data::{read_csv, write_csv, CsvRecord};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Score given to teams without a usable standings record
pub const NEUTRAL_STANDINGS_SCORE: f64 = 500.0;
const MIN_STANDINGS_SCORE: f64 = 100.0;

// Weights for the last-five-matches form score
const W_GOALS_FOR: f64 = 3.0;
const W_GOALS_AGAINST: f64 = -2.0;
const W_FORM: f64 = 1.5;

/// One row of `rankings.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRanking {
    #[serde(alias = "team_name")]
    pub team: String,
    #[serde(alias = "ranking")]
    pub score: f64,
}

impl CsvRecord for TeamRanking {
    const HEADERS: &'static [&'static str] = &["team", "score"];
}

/// Team strength lookup
#[derive(Debug, Clone, Default)]
pub struct Rankings {
    scores: HashMap<String, f64>,
}

impl Rankings {
    pub fn from_rows(rows: &[TeamRanking]) -> Self {
        Self {
            scores: rows.iter().map(|r| (r.team.clone(), r.score)).collect(),
        }
    }

    pub fn get(&self, team: &str) -> Option<f64> {
        self.scores.get(team).copied()
    }

    pub fn contains(&self, team: &str) -> bool {
        self.scores.contains_key(team)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Goals over the last five matches
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamForm {
    pub goals_for: f64,
    pub goals_against: f64,
}

/// Strength score from a league table entry, on a rough 100..1000+ scale
pub fn standing_strength(standing: &ApiStanding) -> f64 {
    let Some(record) = &standing.all else {
        return NEUTRAL_STANDINGS_SCORE;
    };
    let (Some(wins), Some(_draws)) = (record.win, record.draw) else {
        return NEUTRAL_STANDINGS_SCORE;
    };
    let played = match record.played {
        Some(0) | None => 1.0,
        Some(p) => p as f64,
    };

    let points_per_game = standing.points as f64 / played;
    let win_rate = wins as f64 / played;
    let goal_diff_per_game = standing.goals_diff as f64 / played;

    let score = 500.0 + points_per_game * 150.0 + win_rate * 200.0 + goal_diff_per_game * 50.0;
    score.trunc().max(MIN_STANDINGS_SCORE)
}

/// Rankings from league tables; a team listed more than once gets its mean score
pub fn rankings_from_standings(standings: &[ApiStanding]) -> Vec<TeamRanking> {
    let mut totals: HashMap<&str, (f64, u32)> = HashMap::new();
    for standing in standings {
        let entry = totals.entry(standing.team.name.as_str()).or_default();
        entry.0 += standing_strength(standing);
        entry.1 += 1;
    }

    let rows = totals
        .into_iter()
        .map(|(team, (sum, count))| TeamRanking {
            team: team.to_string(),
            score: sum / count as f64,
        })
        .collect();
    sorted(rows)
}

/// Form score from last-five statistics, normalized ELO style around 1000
pub fn statistics_score(stats: &ApiTeamStatistics) -> f64 {
    let last = &stats.fixtures.last_5;
    let avg_goals_for = stats.goals.scored.total.last_5 as f64 / 5.0;
    let avg_goals_against = stats.goals.against.total.last_5 as f64 / 5.0;
    let played = (last.wins + last.draws + last.loses).max(1) as f64;
    let form_ratio = (last.wins as f64 + 0.5 * last.draws as f64) / played;

    let score =
        W_GOALS_FOR * avg_goals_for + W_GOALS_AGAINST * avg_goals_against + W_FORM * form_ratio;
    (score * 100.0 + 1000.0).round_ties_even()
}

/// Rankings from team statistics files; the best score across files wins
pub fn rankings_from_statistics(files: &[Vec<ApiTeamStatistics>]) -> Vec<TeamRanking> {
    let mut best: HashMap<&str, f64> = HashMap::new();
    for stats in files.iter().flatten() {
        let score = statistics_score(stats);
        best.entry(stats.team.name.as_str())
            .and_modify(|current| *current = current.max(score))
            .or_insert(score);
    }

    let rows = best
        .into_iter()
        .map(|(team, score)| TeamRanking {
            team: team.to_string(),
            score,
        })
        .collect();
    sorted(rows)
}

/// Last-five goal totals per team; later files override earlier ones
pub fn team_form(files: &[Vec<ApiTeamStatistics>]) -> HashMap<String, TeamForm> {
    files
        .iter()
        .flatten()
        .map(|stats| {
            (
                stats.team.name.clone(),
                TeamForm {
                    goals_for: stats.goals.scored.total.last_5 as f64,
                    goals_against: stats.goals.against.total.last_5 as f64,
                },
            )
        })
        .collect()
}

fn sorted(mut rows: Vec<TeamRanking>) -> Vec<TeamRanking> {
    rows.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.team.cmp(&b.team))
    });
    rows
}

pub fn save_rankings(rows: &[TeamRanking], path: &Path) -> Result<()> {
    write_csv(rows, path)
}

pub fn load_rankings(path: &Path) -> Result<Rankings> {
    let rows: Vec<TeamRanking> = read_csv(path)?;
    Ok(Rankings::from_rows(&rows))
}
