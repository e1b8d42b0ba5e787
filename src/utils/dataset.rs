use crate::api::football::load_fixtures;
use crate::api::FixtureRow;
use crate::utils::data::{read_csv, write_csv};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Flatten fixture files into one table ordered by kickoff then fixture id
///
/// A fixture present in several files is kept once, last file wins.
pub fn merge_fixtures(files: &[PathBuf]) -> Vec<FixtureRow> {
    let mut rows = load_fixtures(files);
    rows.reverse();
    let mut seen = std::collections::HashSet::new();
    rows.retain(|row| seen.insert(row.fixture_id));
    rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.fixture_id.cmp(&b.fixture_id)));
    rows
}

pub fn save_base_matches(rows: &[FixtureRow], path: &Path) -> Result<()> {
    write_csv(rows, path)
}

pub fn load_base_matches(path: &Path) -> Result<Vec<FixtureRow>> {
    read_csv(path)
}
