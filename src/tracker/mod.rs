pub mod stats;

pub use stats::{LeagueStatistics, RecentPerformance, Statistics};

use crate::api::football::{fixture_files, league_mapping, load_match_results};
use crate::config::{DataPaths, Settings};
use crate::models::{BankrollConfig, BetRecord, BetStatus, Outcome, ValueBet};
use crate::utils::data::{load_value_bets, save_to_cache, write_csv};
use crate::utils::dataset::load_base_matches;
use crate::utils::ev_calculator::{kelly_fraction, round_to, settle_profit};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// League recorded when a bet's match is not in the fixture table
pub const UNKNOWN_LEAGUE: &str = "Inconnue";

/// Errors that leave the ledger unreadable
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt betting history {path}, row {row}: {source}")]
    CorruptHistory {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("corrupt bankroll config {path}: {source}")]
    CorruptConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// How much to stake on each new bet
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Staking {
    /// Default bet size times a multiplier
    Flat { multiplier: f64 },
    /// A fraction of the full Kelly stake on the current bankroll
    Kelly { fraction: f64 },
}

impl Default for Staking {
    fn default() -> Self {
        Staking::Flat { multiplier: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddBetsOutcome {
    Added(usize),
    /// The history already has rows for that day
    AlreadyRecorded,
    NoBetsFile,
    NoValueBets,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettleOutcome {
    Settled {
        updated: usize,
        current_bankroll: f64,
    },
    NoHistory,
    NothingPending,
}

pub struct BettingTracker {
    paths: DataPaths,
    initial_bankroll: f64,
    default_bet_size: f64,
}

impl BettingTracker {
    /// Open the ledger in `data_dir`, creating missing files
    pub fn open(data_dir: &Path, initial_bankroll: f64, default_bet_size: f64) -> Result<Self> {
        let tracker = Self {
            paths: DataPaths::new(data_dir),
            initial_bankroll,
            default_bet_size,
        };
        tracker.initialize_files()?;
        Ok(tracker)
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::open(
            &settings.data_dir,
            settings.initial_bankroll,
            settings.default_bet_size,
        )
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    fn initialize_files(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.root).with_context(|| {
            format!("Failed to create data directory {}", self.paths.root.display())
        })?;

        let config_path = self.paths.bankroll_config();
        if !config_path.exists() {
            let config = BankrollConfig::new(self.initial_bankroll, self.default_bet_size);
            save_to_cache(&config, &config_path)?;
            info!("Created bankroll config {}", config_path.display());
        }

        let history_path = self.paths.history();
        if !history_path.exists() {
            write_csv::<BetRecord>(&[], &history_path)?;
            info!("Created betting history {}", history_path.display());
        }
        Ok(())
    }

    /// Remove both ledger files and start again from the initial bankroll
    pub fn reset(&self) -> Result<()> {
        for path in [self.paths.history(), self.paths.bankroll_config()] {
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
        self.initialize_files()
    }

    pub fn config(&self) -> Result<BankrollConfig> {
        let path = self.paths.bankroll_config();
        let json = std::fs::read_to_string(&path).map_err(LedgerError::Io)?;
        let config = serde_json::from_str(&json)
            .map_err(|source| LedgerError::CorruptConfig { path, source })?;
        Ok(config)
    }

    /// Persist the config, stamping `last_update`
    pub fn save_config(&self, config: &mut BankrollConfig) -> Result<()> {
        config.last_update = Local::now().naive_local();
        save_to_cache(config, &self.paths.bankroll_config())
    }

    /// Full history, empty when the file is missing
    pub fn history(&self) -> Result<Vec<BetRecord>> {
        let path = self.paths.history();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path).map_err(|source| {
            LedgerError::CorruptHistory {
                path: path.clone(),
                row: 0,
                source,
            }
        })?;
        let mut rows = Vec::new();
        for (i, row) in reader.deserialize().enumerate() {
            let row: BetRecord = row.map_err(|source| LedgerError::CorruptHistory {
                path: path.clone(),
                row: i + 1,
                source,
            })?;
            rows.push(row);
        }
        Ok(rows)
    }

    fn save_history(&self, rows: &[BetRecord]) -> Result<()> {
        write_csv(rows, &self.paths.history())
    }

    /// Replace the whole ledger
    pub fn write_state(&self, rows: &[BetRecord], config: &mut BankrollConfig) -> Result<()> {
        self.save_history(rows)?;
        self.save_config(config)
    }

    fn stake_for(&self, staking: Staking, bet: &ValueBet, bankroll: f64) -> f64 {
        match staking {
            Staking::Flat { multiplier } => self.default_bet_size * multiplier,
            Staking::Kelly { fraction } => round_to(
                bankroll * fraction * kelly_fraction(bet.expected_prob, bet.bookmaker_odds),
                2,
            ),
        }
    }

    /// Record a day's value bets as pending rows
    pub fn add_todays_bets(
        &self,
        today: NaiveDate,
        staking: Staking,
        bets: &[ValueBet],
        leagues: &HashMap<String, String>,
    ) -> Result<AddBetsOutcome> {
        let mut history = self.history()?;
        if history.iter().any(|row| row.date == today) {
            warn!("Bets for {} are already in the history", today);
            return Ok(AddBetsOutcome::AlreadyRecorded);
        }
        if bets.is_empty() {
            info!("No value bets to record for {}", today);
            return Ok(AddBetsOutcome::NoValueBets);
        }

        let mut config = self.config()?;
        let current_bankroll = config.current_bankroll;

        let mut added = 0;
        for bet in bets {
            let bet_amount = self.stake_for(staking, bet, current_bankroll);
            if bet_amount <= 0.0 {
                debug!("Zero stake for {} ({}), skipped", bet.match_name, bet.bet_on);
                continue;
            }
            let league = leagues
                .get(&bet.match_name)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_LEAGUE.to_string());

            history.push(BetRecord {
                date: today,
                match_name: bet.match_name.clone(),
                league,
                bet_on: bet.bet_on,
                odds: bet.bookmaker_odds,
                bet_amount,
                predicted_prob: bet.expected_prob,
                expected_value: bet.expected_value,
                status: BetStatus::Pending,
                actual_result: None,
                won: false,
                profit_loss: 0.0,
                bankroll_after: current_bankroll,
            });
            added += 1;
        }

        if added > 0 {
            self.save_history(&history)?;
            config.total_bets += added as u32;
            self.save_config(&mut config)?;
        }
        info!("{} bets added to the history for {}", added, today);
        Ok(AddBetsOutcome::Added(added))
    }

    /// Record `bets_today.csv`, with leagues taken from the base match table
    pub fn add_todays_bets_from_files(
        &self,
        today: NaiveDate,
        staking: Staking,
    ) -> Result<AddBetsOutcome> {
        let bets_path = self.paths.bets_today();
        if !bets_path.exists() {
            warn!("No bets file found: {}", bets_path.display());
            return Ok(AddBetsOutcome::NoBetsFile);
        }
        let bets = load_value_bets(&bets_path)?;

        let matches_path = self.paths.base_matches();
        let leagues = if matches_path.exists() {
            league_mapping(&load_base_matches(&matches_path)?)
        } else {
            HashMap::new()
        };

        self.add_todays_bets(today, staking, &bets, &leagues)
    }

    /// Settle the pending bets of `date` against final results
    pub fn update_results(
        &self,
        date: NaiveDate,
        results: &HashMap<String, Outcome>,
    ) -> Result<SettleOutcome> {
        if !self.paths.history().exists() {
            warn!("No betting history found");
            return Ok(SettleOutcome::NoHistory);
        }

        let mut history = self.history()?;
        if !history
            .iter()
            .any(|row| row.date == date && row.is_pending())
        {
            info!("No pending bets for {}", date);
            return Ok(SettleOutcome::NothingPending);
        }

        let mut config = self.config()?;
        let mut updated = 0;

        for row in history
            .iter_mut()
            .filter(|row| row.date == date && row.is_pending())
        {
            let Some(&actual) = results.get(&row.match_name) else {
                debug!("No result yet for {}", row.match_name);
                continue;
            };
            let won = actual == row.bet_on;
            let profit_loss = settle_profit(row.bet_amount, row.odds, won);

            row.status = BetStatus::Completed;
            row.actual_result = Some(actual);
            row.won = won;
            row.profit_loss = profit_loss;

            config.current_bankroll += profit_loss;
            row.bankroll_after = config.current_bankroll;
            if won {
                config.winning_bets += 1;
            }
            config.total_roi += profit_loss;
            updated += 1;
        }

        self.save_history(&history)?;
        self.save_config(&mut config)?;

        info!(
            "{} bets settled for {}, bankroll {:.2}",
            updated, date, config.current_bankroll
        );
        Ok(SettleOutcome::Settled {
            updated,
            current_bankroll: config.current_bankroll,
        })
    }

    /// Settle `date` from the saved fixture files of that day
    pub fn update_results_from_files(&self, date: NaiveDate) -> Result<SettleOutcome> {
        let files = fixture_files(&self.paths.raw_dir(), date)?;
        let results = load_match_results(&files);
        debug!("{} results found for {}", results.len(), date);
        self.update_results(date, &results)
    }

    pub fn statistics(&self) -> Result<Statistics> {
        Ok(stats::compute_statistics(&self.history()?, &self.config()?))
    }

    pub fn league_statistics(&self) -> Result<Vec<LeagueStatistics>> {
        Ok(stats::league_statistics(&self.history()?))
    }

    pub fn recent_performance(&self, today: NaiveDate, days: i64) -> Result<RecentPerformance> {
        Ok(stats::recent_performance(&self.history()?, today, days))
    }

    /// Pending bets dated `date`
    pub fn pending_on(&self, date: NaiveDate) -> Result<usize> {
        Ok(self
            .history()?
            .iter()
            .filter(|row| row.date == date && row.is_pending())
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::football::fixtures::{envelope, fixture};
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn bet(name: &str, on: Outcome, odds: f64, prob: f64) -> ValueBet {
        ValueBet {
            match_name: name.to_string(),
            bet_on: on,
            bookmaker_odds: odds,
            expected_prob: prob,
            expected_value: round_to(odds * prob - 1.0, 3),
            implied_odds_prob: round_to(1.0 / odds, 3),
            edge: round_to((prob - 1.0 / odds) * 100.0, 2),
        }
    }

    fn slip() -> Vec<ValueBet> {
        vec![
            bet("Arsenal vs Chelsea", Outcome::Home, 2.5, 0.5),
            bet("Lyon vs Nice", Outcome::Draw, 3.4, 0.35),
            bet("Ajax vs PSV", Outcome::Away, 4.0, 0.3),
        ]
    }

    fn tracker(dir: &TempDir) -> BettingTracker {
        BettingTracker::open(dir.path(), 1000.0, 10.0).unwrap()
    }

    #[test]
    fn test_open_creates_files() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        let config = tracker.config().unwrap();
        assert_eq!(config.initial_bankroll, 1000.0);
        assert_eq!(config.current_bankroll, 1000.0);
        assert_eq!(config.total_bets, 0);
        assert!(tracker.history().unwrap().is_empty());

        // Reopening keeps existing state
        let mut config = tracker.config().unwrap();
        config.current_bankroll = 900.0;
        tracker.save_config(&mut config).unwrap();
        let reopened = BettingTracker::open(dir.path(), 5000.0, 10.0).unwrap();
        assert_eq!(reopened.config().unwrap().current_bankroll, 900.0);
    }

    #[test]
    fn test_add_todays_bets() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        let leagues = HashMap::from([(
            "Arsenal vs Chelsea".to_string(),
            "Premier League".to_string(),
        )]);

        let outcome = tracker
            .add_todays_bets(day(4), Staking::Flat { multiplier: 1.5 }, &slip(), &leagues)
            .unwrap();
        assert_eq!(outcome, AddBetsOutcome::Added(3));

        let history = tracker.history().unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|r| r.is_pending() && r.bet_amount == 15.0));
        assert!(history.iter().all(|r| r.bankroll_after == 1000.0));
        assert_eq!(history[0].league, "Premier League");
        assert_eq!(history[1].league, UNKNOWN_LEAGUE);
        assert_eq!(tracker.config().unwrap().total_bets, 3);

        // Same day twice is refused
        let again = tracker
            .add_todays_bets(day(4), Staking::default(), &slip(), &leagues)
            .unwrap();
        assert_eq!(again, AddBetsOutcome::AlreadyRecorded);
        assert_eq!(tracker.history().unwrap().len(), 3);

        let empty = tracker
            .add_todays_bets(day(5), Staking::default(), &[], &leagues)
            .unwrap();
        assert_eq!(empty, AddBetsOutcome::NoValueBets);
    }

    #[test]
    fn test_kelly_staking() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        let bets = vec![
            // b = 1.5, f* = (1.5 * 0.5 - 0.5) / 1.5 = 1/6
            bet("Arsenal vs Chelsea", Outcome::Home, 2.5, 0.5),
            // no edge, nothing staked
            bet("Lyon vs Nice", Outcome::Draw, 3.0, 0.3),
        ];
        let outcome = tracker
            .add_todays_bets(
                day(4),
                Staking::Kelly { fraction: 0.5 },
                &bets,
                &HashMap::new(),
            )
            .unwrap();
        assert_eq!(outcome, AddBetsOutcome::Added(1));
        let history = tracker.history().unwrap();
        assert_eq!(history[0].bet_amount, 83.33);
    }

    #[test]
    fn test_update_results_settles_and_moves_bankroll() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        tracker
            .add_todays_bets(day(4), Staking::default(), &slip(), &HashMap::new())
            .unwrap();

        let results = HashMap::from([
            ("Arsenal vs Chelsea".to_string(), Outcome::Home),
            ("Lyon vs Nice".to_string(), Outcome::Away),
        ]);
        let outcome = tracker.update_results(day(4), &results).unwrap();
        match outcome {
            SettleOutcome::Settled {
                updated,
                current_bankroll,
            } => {
                assert_eq!(updated, 2);
                // +15 then -10
                assert!((current_bankroll - 1005.0).abs() < 1e-9);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let history = tracker.history().unwrap();
        assert_eq!(history[0].status, BetStatus::Completed);
        assert!(history[0].won);
        assert_eq!(history[0].actual_result, Some(Outcome::Home));
        assert!((history[0].profit_loss - 15.0).abs() < 1e-9);
        assert!((history[0].bankroll_after - 1015.0).abs() < 1e-9);
        assert!(!history[1].won);
        assert_eq!(history[1].profit_loss, -10.0);
        assert!((history[1].bankroll_after - 1005.0).abs() < 1e-9);
        // Ajax vs PSV has no result yet
        assert!(history[2].is_pending());

        let config = tracker.config().unwrap();
        assert_eq!(config.winning_bets, 1);
        assert!((config.total_roi - 5.0).abs() < 1e-9);
        assert_eq!(tracker.pending_on(day(4)).unwrap(), 1);

        assert_eq!(
            tracker.update_results(day(3), &results).unwrap(),
            SettleOutcome::NothingPending
        );
    }

    #[test]
    fn test_update_results_from_fixture_files() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        tracker
            .add_todays_bets(day(4), Staking::default(), &slip(), &HashMap::new())
            .unwrap();

        let raw = tracker.paths().raw_dir();
        std::fs::create_dir_all(&raw).unwrap();
        std::fs::write(
            raw.join("fixtures_39_2025-08-04.json"),
            envelope(vec![
                fixture(1, "Premier League", "Arsenal", "Chelsea", Some((0, 1)), "FT"),
                fixture(2, "Eredivisie", "Ajax", "PSV", Some((1, 2)), "FT"),
                fixture(3, "Ligue 1", "Lyon", "Nice", Some((1, 1)), "HT"),
            ]),
        )
        .unwrap();

        let outcome = tracker.update_results_from_files(day(4)).unwrap();
        assert!(matches!(outcome, SettleOutcome::Settled { updated: 2, .. }));
        let history = tracker.history().unwrap();
        assert!(!history[0].won);
        assert!(history[2].won);
        assert!((history[2].profit_loss - 30.0).abs() < 1e-9);
        assert!(history[1].is_pending());
    }

    #[test]
    fn test_add_from_files_reads_league_mapping() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        assert_eq!(
            tracker
                .add_todays_bets_from_files(day(4), Staking::default())
                .unwrap(),
            AddBetsOutcome::NoBetsFile
        );

        crate::utils::data::save_value_bets(&slip(), &tracker.paths().bets_today()).unwrap();
        let rows = vec![crate::api::FixtureRow {
            fixture_id: 9,
            date: "2025-08-04T18:00:00+00:00".to_string(),
            league_id: 88,
            league_name: "Eredivisie".to_string(),
            home: "Ajax".to_string(),
            away: "PSV".to_string(),
            goals_home: None,
            goals_away: None,
            status: "NS".to_string(),
        }];
        crate::utils::dataset::save_base_matches(&rows, &tracker.paths().base_matches()).unwrap();

        let outcome = tracker
            .add_todays_bets_from_files(day(4), Staking::default())
            .unwrap();
        assert_eq!(outcome, AddBetsOutcome::Added(3));
        let history = tracker.history().unwrap();
        assert_eq!(history[2].league, "Eredivisie");
    }

    #[test]
    fn test_corrupt_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        std::fs::write(tracker.paths().bankroll_config(), "{ not json").unwrap();
        let err = tracker.config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::CorruptConfig { .. })
        ));
    }

    #[test]
    fn test_reads_config_with_integer_amounts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("betting_config.json"),
            r#"{
  "initial_bankroll": 1000,
  "current_bankroll": 1012.5,
  "default_bet_size": 10,
  "total_bets": 4,
  "winning_bets": 2,
  "total_roi": 12.5,
  "last_update": "2025-08-04T09:15:02.123456"
}"#,
        )
        .unwrap();
        let tracker = tracker(&dir);
        let config = tracker.config().unwrap();
        assert_eq!(config.current_bankroll, 1012.5);
        assert_eq!(config.total_bets, 4);
    }

    const HISTORY_HEADER: &str = "date,match,league,bet_on,odds,bet_amount,predicted_prob,\
expected_value,status,actual_result,won,profit_loss,bankroll_after\n";

    fn write_history(tracker: &BettingTracker, rows: &str) {
        let body = format!("{}{}", HISTORY_HEADER, rows);
        std::fs::write(tracker.paths().history(), body).unwrap();
    }

    #[test]
    fn test_unknown_status_is_corrupt_history() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        write_history(
            &tracker,
            "2025-08-03,Ajax vs PSV,Eredivisie,Home,2.1,10.0,0.55,0.155,\
             settled,Home,true,11.0,1011.0\n",
        );
        let err = tracker.history().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::CorruptHistory { row: 1, .. })
        ));
        // Settling refuses to rewrite a ledger it cannot read
        assert!(tracker.update_results(day(3), &HashMap::new()).is_err());
    }

    #[test]
    fn test_non_numeric_stake_is_corrupt_history() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        write_history(
            &tracker,
            "2025-08-03,Ajax vs PSV,Eredivisie,Home,2.1,10.0,0.55,0.155,\
             pending,,false,0.0,1000.0\n\
             2025-08-03,Lyon vs Nice,Ligue 1,Draw,3.4,ten,0.33,0.122,\
             pending,,false,0.0,1000.0\n",
        );
        let err = tracker.statistics().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::CorruptHistory { row: 2, .. })
        ));
    }

    #[test]
    fn test_update_results_without_history_file() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        std::fs::remove_file(tracker.paths().history()).unwrap();
        let results = HashMap::from([("Arsenal vs Chelsea".to_string(), Outcome::Home)]);
        assert_eq!(
            tracker.update_results(day(4), &results).unwrap(),
            SettleOutcome::NoHistory
        );
        assert!(!tracker.paths().history().exists());
    }

    #[test]
    fn test_kelly_without_edge_records_nothing() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker(&dir);
        let before = std::fs::read_to_string(tracker.paths().history()).unwrap();
        let bets = vec![
            bet("Lyon vs Nice", Outcome::Draw, 3.0, 0.3),
            bet("Ajax vs PSV", Outcome::Away, 2.0, 0.4),
        ];
        let outcome = tracker
            .add_todays_bets(
                day(4),
                Staking::Kelly { fraction: 1.0 },
                &bets,
                &HashMap::new(),
            )
            .unwrap();
        assert_eq!(outcome, AddBetsOutcome::Added(0));

        assert!(tracker.history().unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(tracker.paths().history()).unwrap(), before);
        let config = tracker.config().unwrap();
        assert_eq!(config.current_bankroll, 1000.0);
        assert_eq!(config.total_bets, 0);
    }
}
