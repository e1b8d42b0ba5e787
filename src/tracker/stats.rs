use crate::models::{BankrollConfig, BetRecord};
use chrono::{Duration, NaiveDate};

/// Global figures over the settled part of the history
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    /// Completed bets only
    pub total_bets: usize,
    pub winning_bets: usize,
    /// Percent of completed bets won
    pub win_rate: f64,
    pub total_roi: f64,
    pub roi_percentage: f64,
    pub initial_bankroll: f64,
    pub current_bankroll: f64,
    pub profit_loss: f64,
    pub avg_odds: f64,
    pub pending_bets: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeagueStatistics {
    pub league: String,
    pub total_bets: usize,
    pub winning_bets: usize,
    pub win_rate: f64,
    pub total_roi: f64,
    pub avg_odds: f64,
    pub avg_expected_value: f64,
}

/// Settled bets over a trailing window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecentPerformance {
    pub days: i64,
    pub bets: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub profit: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn compute_statistics(history: &[BetRecord], config: &BankrollConfig) -> Statistics {
    let completed: Vec<&BetRecord> = history.iter().filter(|r| r.is_completed()).collect();
    let winning_bets = completed.iter().filter(|r| r.won).count();
    let total_roi: f64 = completed.iter().map(|r| r.profit_loss).sum();

    let (roi_percentage, profit_loss) = if history.is_empty() {
        (0.0, 0.0)
    } else {
        (
            total_roi / config.initial_bankroll * 100.0,
            config.current_bankroll - config.initial_bankroll,
        )
    };

    Statistics {
        total_bets: completed.len(),
        winning_bets,
        win_rate: percent(winning_bets, completed.len()),
        total_roi,
        roi_percentage,
        initial_bankroll: config.initial_bankroll,
        current_bankroll: config.current_bankroll,
        profit_loss,
        avg_odds: mean(completed.iter().map(|r| r.odds)),
        pending_bets: history.iter().filter(|r| r.is_pending()).count(),
    }
}

/// Per-league figures over completed bets, most profitable league first
pub fn league_statistics(history: &[BetRecord]) -> Vec<LeagueStatistics> {
    let mut leagues: Vec<&str> = Vec::new();
    for row in history.iter().filter(|r| r.is_completed()) {
        if !leagues.contains(&row.league.as_str()) {
            leagues.push(&row.league);
        }
    }

    let mut stats: Vec<LeagueStatistics> = leagues
        .into_iter()
        .map(|league| {
            let rows: Vec<&BetRecord> = history
                .iter()
                .filter(|r| r.is_completed() && r.league == league)
                .collect();
            let wins = rows.iter().filter(|r| r.won).count();
            LeagueStatistics {
                league: league.to_string(),
                total_bets: rows.len(),
                winning_bets: wins,
                win_rate: percent(wins, rows.len()),
                total_roi: rows.iter().map(|r| r.profit_loss).sum(),
                avg_odds: mean(rows.iter().map(|r| r.odds)),
                avg_expected_value: mean(rows.iter().map(|r| r.expected_value)),
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.total_roi
            .partial_cmp(&a.total_roi)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    stats
}

/// Completed bets dated on or after `today - days`
pub fn recent_performance(
    history: &[BetRecord],
    today: NaiveDate,
    days: i64,
) -> RecentPerformance {
    let since = today - Duration::days(days);
    let recent: Vec<&BetRecord> = history
        .iter()
        .filter(|r| r.is_completed() && r.date >= since)
        .collect();
    let wins = recent.iter().filter(|r| r.won).count();
    RecentPerformance {
        days,
        bets: recent.len(),
        wins,
        win_rate: percent(wins, recent.len()),
        profit: recent.iter().map(|r| r.profit_loss).sum(),
    }
}
