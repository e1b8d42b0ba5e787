use crate::api::FixtureRow;
use crate::models::{MatchPrediction, OutcomeProbabilities};
use crate::utils::ev_calculator::round_to;
use crate::utils::rankings::{Rankings, TeamForm};
use std::collections::HashMap;
use tracing::debug;

/// Rating assumed for teams missing from the rankings
pub const DEFAULT_RATING: f64 = 1500.0;

/// Share of probability mass left for the two win outcomes in the ratio model
const WIN_SHARE: f64 = 0.8;
const RATIO_DRAW_PROB: f64 = 0.20;
const HOME_BONUS: f64 = 0.5;
const MAX_DRAW_PROB: f64 = 0.5;

pub const FIXED_PRIOR: OutcomeProbabilities = OutcomeProbabilities {
    home: 0.5,
    draw: 0.2,
    away: 0.3,
};

const UNIFORM_FALLBACK: OutcomeProbabilities = OutcomeProbabilities {
    home: 0.33,
    draw: 0.34,
    away: 0.33,
};

/// How outcome probabilities are estimated for a fixture
#[derive(Debug, Clone, Copy)]
pub enum Strategy<'a> {
    /// Rating ratio with a fixed draw share
    RankingRatio(&'a Rankings),
    /// Recent goal difference plus home bonus and rating adjustment
    GoalForm {
        form: &'a HashMap<String, TeamForm>,
        rankings: &'a Rankings,
    },
    /// The same prior for every fixture whose teams are both ranked
    FixedPrior(&'a Rankings),
}

/// Probabilities from the ratio of the two ratings
pub fn ranking_ratio_probabilities(
    home: &str,
    away: &str,
    rankings: &Rankings,
) -> OutcomeProbabilities {
    let h = rankings.get(home).unwrap_or(DEFAULT_RATING);
    let a = rankings.get(away).unwrap_or(DEFAULT_RATING);
    let home_prob = h / (h + a);
    let away_prob = 1.0 - home_prob;
    OutcomeProbabilities::new(
        home_prob * WIN_SHARE,
        RATIO_DRAW_PROB,
        away_prob * WIN_SHARE,
    )
}

/// Probabilities from recent goal difference, a home bonus and the ratings
pub fn goal_form_probabilities(
    home_form: TeamForm,
    away_form: TeamForm,
    home: &str,
    away: &str,
    rankings: &Rankings,
) -> OutcomeProbabilities {
    let mut home_score = home_form.goals_for - home_form.goals_against + HOME_BONUS;
    let mut away_score = away_form.goals_for - away_form.goals_against;

    if let Some(rating) = rankings.get(home) {
        home_score += rating / 1000.0;
    }
    if let Some(rating) = rankings.get(away) {
        away_score += rating / 1000.0;
    }

    let total = home_score + away_score;
    if total == 0.0 {
        return UNIFORM_FALLBACK;
    }

    let home_prob = home_score / total;
    let away_prob = away_score / total;
    let draw_prob = (1.0 - (home_prob + away_prob)).clamp(0.0, MAX_DRAW_PROB);

    OutcomeProbabilities::new(
        round_to(home_prob, 3),
        round_to(draw_prob, 3),
        round_to(away_prob, 3),
    )
}

impl Strategy<'_> {
    /// Estimate one fixture; `None` when the strategy has nothing to say about it
    pub fn estimate(&self, home: &str, away: &str) -> Option<OutcomeProbabilities> {
        match self {
            Strategy::RankingRatio(rankings) => {
                Some(ranking_ratio_probabilities(home, away, rankings))
            }
            Strategy::GoalForm { form, rankings } => {
                let home_form = form.get(home).copied().unwrap_or_default();
                let away_form = form.get(away).copied().unwrap_or_default();
                Some(goal_form_probabilities(
                    home_form, away_form, home, away, rankings,
                ))
            }
            Strategy::FixedPrior(rankings) => {
                if rankings.contains(home) && rankings.contains(away) {
                    Some(FIXED_PRIOR)
                } else {
                    None
                }
            }
        }
    }
}

/// Predict every fixture the strategy can estimate
pub fn predict_fixtures(strategy: &Strategy, fixtures: &[FixtureRow]) -> Vec<MatchPrediction> {
    fixtures
        .iter()
        .filter_map(|fixture| {
            let probabilities = strategy.estimate(&fixture.home, &fixture.away);
            if probabilities.is_none() {
                debug!("No estimate for {}", fixture.match_name());
            }
            probabilities.map(|p| MatchPrediction::new(fixture.match_name(), p))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rankings::TeamRanking;

    fn rankings(rows: &[(&str, f64)]) -> Rankings {
        let rows: Vec<TeamRanking> = rows
            .iter()
            .map(|(team, score)| TeamRanking {
                team: team.to_string(),
                score: *score,
            })
            .collect();
        Rankings::from_rows(&rows)
    }

    fn fixture(home: &str, away: &str) -> FixtureRow {
        FixtureRow {
            fixture_id: 1,
            date: "2025-08-04T19:00:00+00:00".to_string(),
            league_id: 39,
            league_name: "Premier League".to_string(),
            home: home.to_string(),
            away: away.to_string(),
            goals_home: None,
            goals_away: None,
            status: "NS".to_string(),
        }
    }

    #[test]
    fn test_ranking_ratio() {
        let r = rankings(&[("Arsenal", 1500.0), ("Chelsea", 500.0)]);
        let p = ranking_ratio_probabilities("Arsenal", "Chelsea", &r);
        assert!((p.home - 0.6).abs() < 1e-9);
        assert!((p.draw - 0.2).abs() < 1e-9);
        assert!((p.away - 0.2).abs() < 1e-9);

        // Unknown teams default to equal ratings
        let p = ranking_ratio_probabilities("Leeds", "Wolves", &r);
        assert!((p.home - 0.4).abs() < 1e-9);
        assert!((p.away - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_goal_form() {
        let r = Rankings::default();
        let home = TeamForm {
            goals_for: 8.0,
            goals_against: 4.0,
        };
        let away = TeamForm {
            goals_for: 6.0,
            goals_against: 4.0,
        };
        // home 4.5, away 2.0 -> 0.692 / 0.308, no mass left for the draw
        let p = goal_form_probabilities(home, away, "A", "B", &r);
        assert_eq!(p.home, 0.692);
        assert_eq!(p.away, 0.308);
        assert_eq!(p.draw, 0.0);
    }

    #[test]
    fn test_goal_form_fallback_when_scores_cancel() {
        let r = Rankings::default();
        let home = TeamForm {
            goals_for: 2.0,
            goals_against: 4.0,
        };
        let away = TeamForm {
            goals_for: 5.0,
            goals_against: 3.5,
        };
        // -1.5 + 1.5 = 0
        let p = goal_form_probabilities(home, away, "A", "B", &r);
        assert_eq!(p, UNIFORM_FALLBACK);
    }

    #[test]
    fn test_goal_form_uses_ratings() {
        let r = rankings(&[("A", 1000.0), ("B", 2000.0)]);
        let p = goal_form_probabilities(TeamForm::default(), TeamForm::default(), "A", "B", &r);
        // home 0.5 + 1.0 = 1.5, away 2.0
        assert_eq!(p.home, round_to(1.5 / 3.5, 3));
        assert_eq!(p.away, round_to(2.0 / 3.5, 3));
    }

    #[test]
    fn test_fixed_prior_requires_ranked_teams() {
        let r = rankings(&[("Arsenal", 1500.0), ("Chelsea", 1400.0)]);
        let strategy = Strategy::FixedPrior(&r);
        let predictions = predict_fixtures(
            &strategy,
            &[fixture("Arsenal", "Chelsea"), fixture("Arsenal", "Leeds")],
        );
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].match_name, "Arsenal vs Chelsea");
        assert_eq!(predictions[0].probabilities(), FIXED_PRIOR);
    }
}
