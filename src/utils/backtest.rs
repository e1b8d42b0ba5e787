use crate::models::BetRecord;
use crate::utils::ev_calculator::{kelly_fraction, round_to, settle_profit};

/// Outcome of replaying the settled history under fractional Kelly staking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KellyBacktest {
    pub fraction: f64,
    pub initial_bankroll: f64,
    pub final_bankroll: f64,
    pub bets_placed: usize,
    /// Bets where Kelly saw no edge
    pub bets_skipped: usize,
    pub wins: usize,
    pub peak_bankroll: f64,
    /// Largest fall from a running peak, as a fraction of that peak
    pub max_drawdown: f64,
    pub max_consecutive_losses: u32,
    /// Bankroll with the stakes actually recorded in the history
    pub flat_final_bankroll: f64,
}

impl KellyBacktest {
    pub fn roi_percentage(&self) -> f64 {
        if self.initial_bankroll == 0.0 {
            return 0.0;
        }
        (self.final_bankroll - self.initial_bankroll) / self.initial_bankroll * 100.0
    }

    pub fn flat_roi_percentage(&self) -> f64 {
        if self.initial_bankroll == 0.0 {
            return 0.0;
        }
        (self.flat_final_bankroll - self.initial_bankroll) / self.initial_bankroll * 100.0
    }
}

/// Replay completed bets in file order, staking `bankroll * fraction * kelly`
pub fn kelly_backtest(
    history: &[BetRecord],
    initial_bankroll: f64,
    fraction: f64,
) -> KellyBacktest {
    let mut bankroll = initial_bankroll;
    let mut peak = initial_bankroll;
    let mut max_drawdown: f64 = 0.0;
    let mut placed = 0;
    let mut skipped = 0;
    let mut wins = 0;
    let mut streak = 0u32;
    let mut max_streak = 0u32;
    let mut flat = initial_bankroll;

    for row in history.iter().filter(|r| r.is_completed()) {
        flat += row.profit_loss;

        let stake = round_to(
            bankroll * fraction * kelly_fraction(row.predicted_prob, row.odds),
            2,
        );
        if stake <= 0.0 || bankroll <= 0.0 {
            skipped += 1;
            continue;
        }

        placed += 1;
        bankroll += settle_profit(stake, row.odds, row.won);
        if row.won {
            wins += 1;
            streak = 0;
        } else {
            streak += 1;
            max_streak = max_streak.max(streak);
        }

        if bankroll > peak {
            peak = bankroll;
        }
        if peak > 0.0 {
            max_drawdown = max_drawdown.max((peak - bankroll) / peak);
        }
    }

    KellyBacktest {
        fraction,
        initial_bankroll,
        final_bankroll: bankroll,
        bets_placed: placed,
        bets_skipped: skipped,
        wins,
        peak_bankroll: peak,
        max_drawdown,
        max_consecutive_losses: max_streak,
        flat_final_bankroll: flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BetStatus, Outcome};
    use chrono::NaiveDate;

    fn settled(odds: f64, prob: f64, won: bool) -> BetRecord {
        BetRecord {
            date: NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
            match_name: "Arsenal vs Chelsea".to_string(),
            league: "Premier League".to_string(),
            bet_on: Outcome::Home,
            odds,
            bet_amount: 10.0,
            predicted_prob: prob,
            expected_value: odds * prob - 1.0,
            status: BetStatus::Completed,
            actual_result: Some(if won { Outcome::Home } else { Outcome::Away }),
            won,
            profit_loss: settle_profit(10.0, odds, won),
            bankroll_after: 0.0,
        }
    }

    #[test]
    fn test_kelly_backtest() {
        let history = vec![
            // f* = 0.5 -> stake 250 at fraction 0.5, wins 250
            settled(2.0, 0.75, true),
            // no edge
            settled(2.0, 0.4, false),
            // f* = 0.5 -> stake 312.5, loses
            settled(2.0, 0.75, false),
        ];
        let result = kelly_backtest(&history, 1000.0, 0.5);
        assert_eq!(result.bets_placed, 2);
        assert_eq!(result.bets_skipped, 1);
        assert_eq!(result.wins, 1);
        assert!((result.peak_bankroll - 1250.0).abs() < 1e-9);
        assert!((result.final_bankroll - 937.5).abs() < 1e-9);
        assert!((result.max_drawdown - 0.25).abs() < 1e-9);
        assert_eq!(result.max_consecutive_losses, 1);
        // flat: +10 -10 -10
        assert!((result.flat_final_bankroll - 990.0).abs() < 1e-9);
        assert!((result.roi_percentage() - -6.25).abs() < 1e-9);
    }

    #[test]
    fn test_pending_rows_are_ignored() {
        let mut pending = settled(2.0, 0.75, false);
        pending.status = BetStatus::Pending;
        pending.profit_loss = 0.0;
        let result = kelly_backtest(&[pending], 1000.0, 0.25);
        assert_eq!(result.bets_placed, 0);
        assert_eq!(result.bets_skipped, 0);
        assert_eq!(result.final_bankroll, 1000.0);
        assert_eq!(result.max_drawdown, 0.0);
    }
}
