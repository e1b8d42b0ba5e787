use crate::analysis::{
    analyse_day, merge_dataset, save_daily_bets, DailyAnalysis, ProbabilitySource,
};
use crate::config::Settings;
use crate::tracker::{
    AddBetsOutcome, BettingTracker, LeagueStatistics, RecentPerformance, SettleOutcome, Staking,
    Statistics,
};
use anyhow::Result;
use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

/// Trailing window shown in the report
pub const RECENT_DAYS: i64 = 7;
const TOP_LEAGUES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinRateAdvice {
    Excellent,
    Correct,
    Weak,
}

impl WinRateAdvice {
    pub fn from_win_rate(win_rate: f64) -> Self {
        if win_rate > 55.0 {
            WinRateAdvice::Excellent
        } else if win_rate > 45.0 {
            WinRateAdvice::Correct
        } else {
            WinRateAdvice::Weak
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            WinRateAdvice::Excellent => "Excellent win rate, keep the current strategy.",
            WinRateAdvice::Correct => "Decent win rate, keep an eye on value bet selection.",
            WinRateAdvice::Weak => "Weak win rate, review the selection criteria.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoiAdvice {
    VeryPositive,
    Positive,
    Negative,
}

impl RoiAdvice {
    pub fn from_roi(roi_percentage: f64) -> Self {
        if roi_percentage > 10.0 {
            RoiAdvice::VeryPositive
        } else if roi_percentage > 0.0 {
            RoiAdvice::Positive
        } else {
            RoiAdvice::Negative
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RoiAdvice::VeryPositive => "Very positive ROI, excellent performance.",
            RoiAdvice::Positive => "Positive ROI, heading the right way.",
            RoiAdvice::Negative => "Negative ROI, watch stakes and selections.",
        }
    }
}

/// Snapshot of the ledger with advice
#[derive(Debug, Clone)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub statistics: Statistics,
    pub recent: RecentPerformance,
    pub top_leagues: Vec<LeagueStatistics>,
    pub win_rate_advice: WinRateAdvice,
    pub roi_advice: RoiAdvice,
}

impl DailyReport {
    pub fn build(tracker: &BettingTracker, date: NaiveDate) -> Result<Self> {
        let statistics = tracker.statistics()?;
        let recent = tracker.recent_performance(date, RECENT_DAYS)?;
        let mut top_leagues = tracker.league_statistics()?;
        top_leagues.truncate(TOP_LEAGUES);
        Ok(Self {
            date,
            win_rate_advice: WinRateAdvice::from_win_rate(statistics.win_rate),
            roi_advice: RoiAdvice::from_roi(statistics.roi_percentage),
            statistics,
            recent,
            top_leagues,
        })
    }

    pub fn format(&self) -> String {
        let s = &self.statistics;
        let mut out = format!("Daily report {}\n", self.date);
        out.push_str(&format!("  Bankroll:      {:.2}\n", s.current_bankroll));
        out.push_str(&format!("  Profit/Loss:   {:+.2}\n", s.profit_loss));
        out.push_str(&format!(
            "  Win rate:      {:.1}% ({}/{})\n",
            s.win_rate, s.winning_bets, s.total_bets
        ));
        out.push_str(&format!("  ROI:           {:+.1}%\n", s.roi_percentage));
        out.push_str(&format!("  Pending bets:  {}\n", s.pending_bets));

        if self.recent.bets > 0 {
            out.push_str(&format!("\nLast {} days:\n", self.recent.days));
            out.push_str(&format!("  Profit: {:+.2}\n", self.recent.profit));
            out.push_str(&format!(
                "  Bets:   {} ({} won, {:.1}%)\n",
                self.recent.bets, self.recent.wins, self.recent.win_rate
            ));
        }

        if !self.top_leagues.is_empty() {
            out.push_str("\nTop leagues:\n");
            for (i, league) in self.top_leagues.iter().enumerate() {
                out.push_str(&format!(
                    "  {}. {}: {:+.2} ({:.1}% over {} bets)\n",
                    i + 1,
                    league.league,
                    league.total_roi,
                    league.win_rate,
                    league.total_bets
                ));
            }
        }

        out.push_str("\nAdvice:\n");
        out.push_str(&format!("  {}\n", self.win_rate_advice.message()));
        out.push_str(&format!("  {}\n", self.roi_advice.message()));
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DailyOptions {
    pub source: ProbabilitySource,
    pub threshold: f64,
    /// Record today's value bets in the ledger
    pub auto_add: bool,
    pub multiplier: f64,
}

#[derive(Debug, Clone)]
pub struct DailyRun {
    pub yesterday: NaiveDate,
    /// `None` when nothing was pending for yesterday
    pub settled: Option<SettleOutcome>,
    pub analysis: Option<DailyAnalysis>,
    pub analysis_error: Option<String>,
    pub added: Option<AddBetsOutcome>,
    pub report: DailyReport,
}

pub fn run_daily(
    settings: &Settings,
    tracker: &BettingTracker,
    today: NaiveDate,
    options: DailyOptions,
) -> Result<DailyRun> {
    let yesterday = today - Duration::days(1);

    let settled = if tracker.pending_on(yesterday)? > 0 {
        Some(tracker.update_results_from_files(yesterday)?)
    } else {
        info!("Nothing pending for {}", yesterday);
        None
    };

    merge_dataset(tracker.paths())?;
    let (analysis, analysis_error) =
        match analyse_day(settings, today, options.source, options.threshold) {
            Ok(analysis) => {
                save_daily_bets(tracker.paths(), today, &analysis.value_bets)?;
                (Some(analysis), None)
            }
            Err(e) => {
                warn!("Analysis of {} failed: {:#}", today, e);
                (None, Some(format!("{:#}", e)))
            }
        };

    let added = if options.auto_add && analysis.is_some() {
        Some(tracker.add_todays_bets_from_files(
            today,
            Staking::Flat {
                multiplier: options.multiplier,
            },
        )?)
    } else {
        None
    };

    let report = DailyReport::build(tracker, today)?;
    Ok(DailyRun {
        yesterday,
        settled,
        analysis,
        analysis_error,
        added,
        report,
    })
}
