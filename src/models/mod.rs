use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Result of a football match from the home side's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Home, Outcome::Draw, Outcome::Away];

    pub fn from_goals(home: u32, away: u32) -> Self {
        if home > away {
            Outcome::Home
        } else if away > home {
            Outcome::Away
        } else {
            Outcome::Draw
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Home => "Home",
            Outcome::Draw => "Draw",
            Outcome::Away => "Away",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Home" => Some(Outcome::Home),
            "Draw" => Some(Outcome::Draw),
            "Away" => Some(Outcome::Away),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key used to join fixtures, odds, predictions and ledger rows
pub fn match_name(home: &str, away: &str) -> String {
    format!("{} vs {}", home, away)
}

/// Decimal 1X2 odds from a single bookmaker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOdds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl MatchOdds {
    pub fn get(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }
}

/// Estimated probabilities for the three outcomes of a match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProbabilities {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OutcomeProbabilities {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self { home, draw, away }
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }
}

/// One row of a predictions file (`match,prob_home,prob_draw,prob_away`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPrediction {
    #[serde(rename = "match")]
    pub match_name: String,
    pub prob_home: f64,
    pub prob_draw: f64,
    pub prob_away: f64,
}

impl MatchPrediction {
    pub fn new(match_name: String, probabilities: OutcomeProbabilities) -> Self {
        Self {
            match_name,
            prob_home: probabilities.home,
            prob_draw: probabilities.draw,
            prob_away: probabilities.away,
        }
    }

    pub fn probabilities(&self) -> OutcomeProbabilities {
        OutcomeProbabilities::new(self.prob_home, self.prob_draw, self.prob_away)
    }
}

/// A bet whose estimated probability beats the bookmaker price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBet {
    #[serde(rename = "match")]
    pub match_name: String,
    pub bet_on: Outcome,
    pub bookmaker_odds: f64,
    pub expected_prob: f64,
    pub expected_value: f64,
    pub implied_odds_prob: f64,
    /// Probability edge in percentage points
    pub edge: f64,
}

impl ValueBet {
    /// Format the bet as a readable line
    pub fn format(&self) -> String {
        format!(
            "{} | Bet: {} @ {:.2} | Prob: {:.1}% vs Implied: {:.1}% | EV: {:+.1}% | Edge: {:+.1}%",
            self.match_name,
            self.bet_on,
            self.bookmaker_odds,
            self.expected_prob * 100.0,
            self.implied_odds_prob * 100.0,
            self.expected_value * 100.0,
            self.edge
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Completed,
}

/// One row of the betting history ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRecord {
    pub date: NaiveDate,
    #[serde(rename = "match")]
    pub match_name: String,
    pub league: String,
    pub bet_on: Outcome,
    pub odds: f64,
    pub bet_amount: f64,
    pub predicted_prob: f64,
    pub expected_value: f64,
    pub status: BetStatus,
    pub actual_result: Option<Outcome>,
    #[serde(deserialize_with = "deserialize_loose_bool")]
    pub won: bool,
    pub profit_loss: f64,
    pub bankroll_after: f64,
}

impl BetRecord {
    pub fn is_pending(&self) -> bool {
        self.status == BetStatus::Pending
    }

    pub fn is_completed(&self) -> bool {
        self.status == BetStatus::Completed
    }

    pub fn format(&self) -> String {
        let result = match self.actual_result {
            Some(actual) if self.won => format!("won ({})", actual),
            Some(actual) => format!("lost ({})", actual),
            None => "pending".to_string(),
        };
        format!(
            "{} | {} [{}] | {} @ {:.2} | Stake: {:.2} | {} | P/L: {:+.2} | Bankroll: {:.2}",
            self.date,
            self.match_name,
            self.league,
            self.bet_on,
            self.odds,
            self.bet_amount,
            result,
            self.profit_loss,
            self.bankroll_after
        )
    }
}

/// Accepts `true`/`false` as well as capitalized `True`/`False`
fn deserialize_loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid boolean value: {}",
            other
        ))),
    }
}

/// Bankroll state persisted next to the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankrollConfig {
    pub initial_bankroll: f64,
    pub current_bankroll: f64,
    pub default_bet_size: f64,
    /// Number of bets ever recorded, pending ones included
    pub total_bets: u32,
    pub winning_bets: u32,
    /// Cumulative settled profit in currency units
    pub total_roi: f64,
    pub last_update: NaiveDateTime,
}

impl BankrollConfig {
    pub fn new(initial_bankroll: f64, default_bet_size: f64) -> Self {
        Self {
            initial_bankroll,
            current_bankroll: initial_bankroll,
            default_bet_size,
            total_bets: 0,
            winning_bets: 0,
            total_roi: 0.0,
            last_update: Local::now().naive_local(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_goals() {
        assert_eq!(Outcome::from_goals(2, 1), Outcome::Home);
        assert_eq!(Outcome::from_goals(0, 3), Outcome::Away);
        assert_eq!(Outcome::from_goals(1, 1), Outcome::Draw);
    }

    #[test]
    fn test_match_name() {
        assert_eq!(match_name("Arsenal", "Chelsea"), "Arsenal vs Chelsea");
    }

    #[test]
    fn test_bet_record_reads_capitalized_booleans() {
        let data = "\
date,match,league,bet_on,odds,bet_amount,predicted_prob,expected_value,\
status,actual_result,won,profit_loss,bankroll_after
2025-08-03,Ajax vs PSV,Eredivisie,Home,2.1,10.0,0.55,0.155,completed,Home,True,11.0,1011.0
2025-08-04,Lyon vs Nice,Ligue 1,Draw,3.4,10.0,0.33,0.122,pending,,False,0.0,1011.0
";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<BetRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].won);
        assert_eq!(rows[0].actual_result, Some(Outcome::Home));
        assert_eq!(rows[0].status, BetStatus::Completed);
        assert!(!rows[1].won);
        assert_eq!(rows[1].actual_result, None);
        assert!(rows[1].is_pending());
    }

    #[test]
    fn test_bet_record_reads_numeric_booleans() {
        let data = "\
date,match,league,bet_on,odds,bet_amount,predicted_prob,expected_value,\
status,actual_result,won,profit_loss,bankroll_after
2025-08-03,Ajax vs PSV,Eredivisie,Home,2.1,10.0,0.55,0.155,completed,Home,1,11.0,1011.0
2025-08-03,Lyon vs Nice,Ligue 1,Draw,3.4,10.0,0.33,0.122,completed,Away,0,-10.0,1001.0
";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<BetRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();

        assert!(rows[0].won);
        assert!(!rows[1].won);
        assert_eq!(rows[1].actual_result, Some(Outcome::Away));
        assert_eq!(rows[1].profit_loss, -10.0);
    }
}
