use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_INITIAL_BANKROLL: f64 = 1000.0;
const DEFAULT_BET_SIZE: f64 = 10.0;
const DEFAULT_VALUE_THRESHOLD: f64 = 0.05;
const DEFAULT_BOOKMAKER: &str = "Bet365";

/// Runtime settings, read from the environment (and `.env`)
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub initial_bankroll: f64,
    pub default_bet_size: f64,
    /// Minimum expected value for a bet to count as value
    pub value_threshold: f64,
    pub bookmaker: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            initial_bankroll: DEFAULT_INITIAL_BANKROLL,
            default_bet_size: DEFAULT_BET_SIZE,
            value_threshold: DEFAULT_VALUE_THRESHOLD,
            bookmaker: DEFAULT_BOOKMAKER.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            data_dir: lookup("BETTING_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            initial_bankroll: parse_var(&lookup, "INITIAL_BANKROLL")?
                .unwrap_or(defaults.initial_bankroll),
            default_bet_size: parse_var(&lookup, "DEFAULT_BET_SIZE")?
                .unwrap_or(defaults.default_bet_size),
            value_threshold: parse_var(&lookup, "VALUE_THRESHOLD")?
                .unwrap_or(defaults.value_threshold),
            bookmaker: lookup("BOOKMAKER").unwrap_or(defaults.bookmaker),
        })
    }

    pub fn paths(&self) -> DataPaths {
        DataPaths::new(&self.data_dir)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            let value = raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", key, raw))?;
            Ok(Some(value))
        }
        _ => Ok(None),
    }
}

/// File layout under the data directory
#[derive(Debug, Clone, PartialEq)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn base_matches(&self) -> PathBuf {
        self.root.join("processed").join("base_matches.csv")
    }

    pub fn rankings(&self) -> PathBuf {
        self.root.join("rankings.csv")
    }

    pub fn bets_today(&self) -> PathBuf {
        self.root.join("bets_today.csv")
    }

    /// Dated snapshot of a day's value bets
    pub fn bets_for(&self, date: chrono::NaiveDate) -> PathBuf {
        self.root.join(format!("bets_{}.csv", date))
    }

    pub fn bet_results_for(&self, date: chrono::NaiveDate) -> PathBuf {
        self.root.join(format!("bets_results_{}.csv", date))
    }

    pub fn model_predictions(&self) -> PathBuf {
        self.root.join("lstm").join("predictions_today.csv")
    }

    pub fn history(&self) -> PathBuf {
        self.root.join("betting_history.csv")
    }

    pub fn bankroll_config(&self) -> PathBuf {
        self.root.join("betting_config.json")
    }
}
