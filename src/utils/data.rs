use crate::api::FixtureRow;
use crate::models::{BetRecord, MatchPrediction, ValueBet};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A row type with a fixed CSV header, written even when there are no rows
pub trait CsvRecord {
    const HEADERS: &'static [&'static str];
}

impl CsvRecord for ValueBet {
    const HEADERS: &'static [&'static str] = &[
        "match",
        "bet_on",
        "bookmaker_odds",
        "expected_prob",
        "expected_value",
        "implied_odds_prob",
        "edge",
    ];
}

impl CsvRecord for MatchPrediction {
    const HEADERS: &'static [&'static str] = &["match", "prob_home", "prob_draw", "prob_away"];
}

impl CsvRecord for FixtureRow {
    const HEADERS: &'static [&'static str] = &[
        "fixture_id",
        "date",
        "league_id",
        "league_name",
        "home",
        "away",
        "goals_home",
        "goals_away",
        "status",
    ];
}

impl CsvRecord for BetRecord {
    const HEADERS: &'static [&'static str] = &[
        "date",
        "match",
        "league",
        "bet_on",
        "odds",
        "bet_amount",
        "predicted_prob",
        "expected_value",
        "status",
        "actual_result",
        "won",
        "profit_loss",
        "bankroll_after",
    ];
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `contents` through a sibling temp file
pub fn write_replacing(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Save data to a pretty-printed JSON file
pub fn save_to_cache<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize data")?;
    write_replacing(path, json.as_bytes())
}

/// Load data from a JSON file
pub fn load_from_cache<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let data = serde_json::from_str(&json)
        .with_context(|| format!("Failed to deserialize {}", path.display()))?;
    Ok(data)
}

/// Write rows to CSV with the record's header
pub fn write_csv<T: CsvRecord + Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(T::HEADERS)?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to serialize row for {}", path.display()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV buffer: {}", e))?;
    write_replacing(path, &bytes)
}

/// Read every row of a CSV file
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for (i, row) in reader.deserialize().enumerate() {
        let row: T =
            row.with_context(|| format!("Invalid row {} in {}", i + 1, path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Save value bets to CSV, sorted as given
pub fn save_value_bets(bets: &[ValueBet], path: &Path) -> Result<()> {
    write_csv(bets, path)
}

pub fn load_value_bets(path: &Path) -> Result<Vec<ValueBet>> {
    read_csv(path)
}

/// Load model probabilities (`match,prob_home,prob_draw,prob_away`)
pub fn load_predictions(path: &Path) -> Result<Vec<MatchPrediction>> {
    read_csv(path)
}

pub fn save_predictions(predictions: &[MatchPrediction], path: &Path) -> Result<()> {
    write_csv(predictions, path)
}
