/// Convert decimal odds to implied probability
/// Odds of 2.50 mean a 1 unit stake returns 2.50 (1.50 profit), i.e. 40%
pub fn implied_probability(odds: f64) -> f64 {
    1.0 / odds
}

/// Calculate expected value for a bet
/// EV = (odds * probability of winning) - 1
/// Returns EV per unit staked (0.05 = +5%)
pub fn expected_value(model_prob: f64, odds: f64) -> f64 {
    (odds * model_prob) - 1.0
}

/// Difference between model probability and implied probability, in percentage points
pub fn edge_percent(model_prob: f64, odds: f64) -> f64 {
    (model_prob - implied_probability(odds)) * 100.0
}

/// Profit or loss of a settled bet
pub fn settle_profit(stake: f64, odds: f64, won: bool) -> f64 {
    if won {
        stake * (odds - 1.0)
    } else {
        -stake
    }
}

/// Kelly criterion: fraction of the bankroll to stake
///
/// f* = (b * p - q) / b with b = odds - 1 (net odds), q = 1 - p.
/// Negative edges return 0; the result never exceeds 1.
pub fn kelly_fraction(model_prob: f64, odds: f64) -> f64 {
    let b = odds - 1.0;
    if b <= 0.0 {
        return 0.0;
    }
    let q = 1.0 - model_prob;
    ((b * model_prob - q) / b).clamp(0.0, 1.0)
}

/// Round to a number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
