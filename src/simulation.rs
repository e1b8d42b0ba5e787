use crate::models::{BankrollConfig, BetRecord, BetStatus, Outcome};
use crate::tracker::BettingTracker;
use crate::utils::ev_calculator::{round_to, settle_profit};
use anyhow::{bail, Result};
use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::Range;
use tracing::info;

const MAX_BETS_PER_DAY: usize = 8;
const STAKE_RANGE: Range<f64> = 5.0..25.0;

pub const DEMO_LEAGUES: &[(&str, &[&str])] = &[
    (
        "Premier League",
        &[
            "Manchester City",
            "Arsenal",
            "Liverpool",
            "Chelsea",
            "Manchester United",
            "Newcastle",
        ],
    ),
    (
        "La Liga",
        &[
            "Real Madrid",
            "Barcelona",
            "Atletico Madrid",
            "Sevilla",
            "Valencia",
            "Real Sociedad",
        ],
    ),
    (
        "Serie A",
        &["Inter Milan", "Juventus", "AC Milan", "Napoli", "AS Roma", "Lazio"],
    ),
    (
        "Bundesliga",
        &[
            "Bayern Munich",
            "Borussia Dortmund",
            "RB Leipzig",
            "Bayer Leverkusen",
            "Eintracht Frankfurt",
        ],
    ),
    (
        "Ligue 1",
        &["PSG", "Marseille", "Monaco", "Lyon", "Lille", "Nice"],
    ),
    (
        "Championship",
        &["Leicester City", "Leeds United", "Southampton", "West Brom", "Middlesbrough"],
    ),
    (
        "Eredivisie",
        &["Ajax", "PSV", "Feyenoord", "AZ Alkmaar", "FC Utrecht"],
    ),
    (
        "Primeira Liga",
        &["Porto", "Benfica", "Sporting CP", "Braga", "Vitoria SC"],
    ),
    (
        "Liga MX",
        &["Club America", "Chivas", "Cruz Azul", "Tigres", "Monterrey"],
    ),
    (
        "MLS",
        &["LAFC", "Seattle Sounders", "Atlanta United", "New York City FC", "Toronto FC"],
    ),
];

/// Totals of a generated history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoSummary {
    pub days: i64,
    pub total_bets: usize,
    pub winning_bets: usize,
    pub initial_bankroll: f64,
    pub final_bankroll: f64,
}

impl DemoSummary {
    pub fn win_rate(&self) -> f64 {
        if self.total_bets == 0 {
            0.0
        } else {
            self.winning_bets as f64 / self.total_bets as f64 * 100.0
        }
    }

    pub fn roi_percentage(&self) -> f64 {
        (self.final_bankroll - self.initial_bankroll) / self.initial_bankroll * 100.0
    }
}

fn odds_range(outcome: Outcome) -> Range<f64> {
    match outcome {
        Outcome::Home => 1.5..4.0,
        Outcome::Draw => 2.8..4.5,
        Outcome::Away => 1.8..6.0,
    }
}

/// Draw one settled bet
fn demo_bet<R: Rng + ?Sized>(rng: &mut R, date: NaiveDate) -> BetRecord {
    let (league, teams) = DEMO_LEAGUES[rng.gen_range(0..DEMO_LEAGUES.len())];
    let mut pair = teams.choose_multiple(rng, 2);
    let (home, away) = match (pair.next(), pair.next()) {
        (Some(home), Some(away)) => (*home, *away),
        _ => ("Team A", "Team B"),
    };

    let bet_on = Outcome::ALL[rng.gen_range(0..Outcome::ALL.len())];
    let odds = round_to(rng.gen_range(odds_range(bet_on)), 2);
    let bet_amount = rng.gen_range(STAKE_RANGE);

    let predicted_prob = (1.0 / odds + rng.gen_range(-0.1..0.2)).clamp(0.1, 0.9);
    let expected_value = odds * predicted_prob - 1.0;

    let bias = if expected_value > 0.05 { 1.1 } else { 0.9 };
    let win_probability = (predicted_prob * bias).clamp(0.05, 0.95);
    let won = rng.gen::<f64>() < win_probability;

    let actual_result = if won {
        bet_on
    } else {
        let others: Vec<Outcome> = Outcome::ALL.into_iter().filter(|o| *o != bet_on).collect();
        others[rng.gen_range(0..others.len())]
    };

    BetRecord {
        date,
        match_name: crate::models::match_name(home, away),
        league: league.to_string(),
        bet_on,
        odds,
        bet_amount: round_to(bet_amount, 2),
        predicted_prob: round_to(predicted_prob, 3),
        expected_value: round_to(expected_value, 3),
        status: BetStatus::Completed,
        actual_result: Some(actual_result),
        won,
        profit_loss: round_to(settle_profit(bet_amount, odds, won), 2),
        bankroll_after: 0.0,
    }
}

/// Replace the ledger with `days` days of settled random bets ending the day before `end_date`
pub fn create_demo_history<R: Rng + ?Sized>(
    tracker: &BettingTracker,
    rng: &mut R,
    days: i64,
    end_date: NaiveDate,
) -> Result<DemoSummary> {
    let start = match Duration::try_days(days).and_then(|d| end_date.checked_sub_signed(d)) {
        Some(start) if days >= 0 => start,
        _ => bail!("Cannot generate {} days of history before {}", days, end_date),
    };

    tracker.reset()?;
    let mut config: BankrollConfig = tracker.config()?;
    let initial_bankroll = config.initial_bankroll;

    let mut history = Vec::new();
    for offset in 0..days {
        let date = start + Duration::days(offset);
        let count = rng.gen_range(0..=MAX_BETS_PER_DAY);
        for _ in 0..count {
            history.push(demo_bet(rng, date));
        }
    }

    let mut bankroll = initial_bankroll;
    for row in &mut history {
        bankroll += row.profit_loss;
        row.bankroll_after = round_to(bankroll, 2);
    }
    let winning_bets = history.iter().filter(|r| r.won).count();

    if !history.is_empty() {
        config.current_bankroll = bankroll;
        config.total_bets = history.len() as u32;
        config.winning_bets = winning_bets as u32;
        config.total_roi = bankroll - initial_bankroll;
        tracker.write_state(&history, &mut config)?;
    }

    info!(
        "Demo history created: {} bets over {} days, bankroll {:.2}",
        history.len(),
        days,
        bankroll
    );
    Ok(DemoSummary {
        days,
        total_bets: history.len(),
        winning_bets,
        initial_bankroll,
        final_bankroll: bankroll,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn end_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    #[test]
    fn test_demo_bets_respect_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let bet = demo_bet(&mut rng, end_date());
            let range = odds_range(bet.bet_on);
            assert!(bet.odds >= range.start && bet.odds <= range.end);
            assert!(bet.bet_amount >= 5.0 && bet.bet_amount <= 25.0);
            assert!(bet.predicted_prob >= 0.1 && bet.predicted_prob <= 0.9);
            assert!(bet.is_completed());
            assert_eq!(bet.won, bet.actual_result == Some(bet.bet_on));

            let (home, away) = bet.match_name.split_once(" vs ").unwrap();
            assert_ne!(home, away);
            let teams = DEMO_LEAGUES
                .iter()
                .find(|(league, _)| *league == bet.league)
                .map(|(_, teams)| *teams)
                .unwrap();
            assert!(teams.contains(&home) && teams.contains(&away));
        }
    }

    #[test]
    fn test_create_demo_history() {
        let dir = TempDir::new().unwrap();
        let tracker = BettingTracker::open(dir.path(), 1000.0, 10.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let summary = create_demo_history(&tracker, &mut rng, 30, end_date()).unwrap();

        let history = tracker.history().unwrap();
        assert_eq!(history.len(), summary.total_bets);
        assert!(history.len() <= 30 * MAX_BETS_PER_DAY);
        assert!(history.iter().all(|r| r.date < end_date()));
        assert!(history
            .iter()
            .all(|r| r.date >= end_date() - Duration::days(30)));

        // bankroll_after is the running bankroll
        let mut running = 1000.0;
        for row in &history {
            running += row.profit_loss;
            assert!((row.bankroll_after - round_to(running, 2)).abs() < 1e-6);
        }

        let config = tracker.config().unwrap();
        if summary.total_bets > 0 {
            assert_eq!(config.total_bets as usize, summary.total_bets);
            assert_eq!(config.winning_bets as usize, summary.winning_bets);
            assert!((config.current_bankroll - summary.final_bankroll).abs() < 1e-6);
        }
        let stats = tracker.statistics().unwrap();
        assert_eq!(stats.pending_bets, 0);
        assert_eq!(stats.total_bets, summary.total_bets);
    }

    #[test]
    fn test_same_seed_same_history() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let a = BettingTracker::open(first.path(), 1000.0, 10.0).unwrap();
        let b = BettingTracker::open(second.path(), 1000.0, 10.0).unwrap();
        create_demo_history(&a, &mut StdRng::seed_from_u64(3), 10, end_date()).unwrap();
        create_demo_history(&b, &mut StdRng::seed_from_u64(3), 10, end_date()).unwrap();
        assert_eq!(a.history().unwrap(), b.history().unwrap());
    }

    #[test]
    fn test_out_of_range_days_keep_ledger() {
        let dir = TempDir::new().unwrap();
        let tracker = BettingTracker::open(dir.path(), 1000.0, 10.0).unwrap();
        create_demo_history(&tracker, &mut StdRng::seed_from_u64(5), 5, end_date()).unwrap();
        let before = tracker.history().unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        assert!(create_demo_history(&tracker, &mut rng, i64::MAX, end_date()).is_err());
        assert!(create_demo_history(&tracker, &mut rng, -3, end_date()).is_err());
        assert_eq!(tracker.history().unwrap(), before);
    }
}
