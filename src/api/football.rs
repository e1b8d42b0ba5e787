use crate::models::{match_name, MatchOdds, Outcome};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fixture statuses that carry a final score
const FINISHED_STATUSES: [&str; 3] = ["FT", "AET", "PEN"];

const MATCH_WINNER_MARKET: &str = "Match Winner";

/// Top level envelope shared by every API-Football endpoint
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub response: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiFixture {
    pub fixture: FixtureInfo,
    #[serde(default)]
    pub league: LeagueInfo,
    pub teams: Teams,
    #[serde(default)]
    pub goals: Goals,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureInfo {
    pub id: u64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub status: FixtureStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureStatus {
    #[serde(default)]
    pub short: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeagueInfo {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Teams {
    pub home: TeamRef,
    pub away: TeamRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Goals {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiOdds {
    pub fixture: OddsFixtureRef,
    #[serde(default)]
    pub bookmakers: Vec<ApiBookmaker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OddsFixtureRef {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiBookmaker {
    pub name: String,
    #[serde(default)]
    pub bets: Vec<ApiBet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiBet {
    pub name: String,
    #[serde(default)]
    pub values: Vec<ApiOddValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiOddValue {
    pub value: String,
    /// Decimal odd, sent as a string
    pub odd: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiStandingsLeague {
    pub league: StandingsLeague,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandingsLeague {
    #[serde(default)]
    pub standings: Vec<Vec<ApiStanding>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStanding {
    pub team: TeamRef,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub goals_diff: i64,
    pub all: Option<StandingRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandingRecord {
    pub played: Option<u32>,
    pub win: Option<u32>,
    pub draw: Option<u32>,
    pub lose: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTeamStatistics {
    pub team: TeamRef,
    #[serde(default)]
    pub fixtures: StatisticsFixtures,
    #[serde(default)]
    pub goals: StatisticsGoals,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsFixtures {
    #[serde(default)]
    pub last_5: LastFiveRecord,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastFiveRecord {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub draws: u32,
    #[serde(default)]
    pub loses: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsGoals {
    #[serde(default, rename = "for")]
    pub scored: GoalTotals,
    #[serde(default)]
    pub against: GoalTotals,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalTotals {
    #[serde(default)]
    pub total: LastFiveGoals,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastFiveGoals {
    #[serde(default)]
    pub last_5: u32,
}

/// A fixture flattened into one table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRow {
    pub fixture_id: u64,
    pub date: String,
    pub league_id: u64,
    pub league_name: String,
    pub home: String,
    pub away: String,
    pub goals_home: Option<u32>,
    pub goals_away: Option<u32>,
    pub status: String,
}

impl FixtureRow {
    pub fn match_name(&self) -> String {
        match_name(&self.home, &self.away)
    }

    pub fn is_finished(&self) -> bool {
        FINISHED_STATUSES.contains(&self.status.as_str())
    }

    /// Final result, only for finished fixtures with both scores
    pub fn result(&self) -> Option<Outcome> {
        if !self.is_finished() {
            return None;
        }
        match (self.goals_home, self.goals_away) {
            (Some(home), Some(away)) => Some(Outcome::from_goals(home, away)),
            _ => None,
        }
    }
}

impl From<ApiFixture> for FixtureRow {
    fn from(api: ApiFixture) -> Self {
        FixtureRow {
            fixture_id: api.fixture.id,
            date: api.fixture.date,
            league_id: api.league.id,
            league_name: api.league.name,
            home: api.teams.home.name,
            away: api.teams.away.name,
            goals_home: api.goals.home,
            goals_away: api.goals.away,
            status: api.fixture.status.short,
        }
    }
}

/// Read one saved response envelope
///
/// Entries that do not match `T` are logged and skipped, the rest of the file is kept.
pub fn read_envelope<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let envelope: ApiEnvelope<Value> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let mut items = Vec::with_capacity(envelope.response.len());
    for (i, item) in envelope.response.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(item) => items.push(item),
            Err(e) => warn!("Skipping entry {} of {}: {}", i, path.display(), e),
        }
    }
    Ok(items)
}

/// Read every file, skipping the ones that cannot be parsed
fn read_all<T: DeserializeOwned>(files: &[PathBuf]) -> Vec<T> {
    let mut items = Vec::new();
    for path in files {
        match read_envelope::<T>(path) {
            Ok(mut response) => {
                debug!("Loaded {} entries from {}", response.len(), path.display());
                items.append(&mut response);
            }
            Err(e) => warn!("Skipping {}: {:#}", path.display(), e),
        }
    }
    items
}

/// List files in `dir` whose name matches `prefix*suffix`, sorted by name
pub fn list_files(dir: &Path, prefix: &str, suffix: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory {}", dir.display()))?
    {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.len() >= prefix.len() + suffix.len()
            && name.starts_with(prefix)
            && name.ends_with(suffix)
            && path.is_file()
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn fixture_files(raw_dir: &Path, date: NaiveDate) -> Result<Vec<PathBuf>> {
    list_files(raw_dir, "fixtures_", &format!("_{}.json", date))
}

pub fn all_fixture_files(raw_dir: &Path) -> Result<Vec<PathBuf>> {
    list_files(raw_dir, "fixtures_", ".json")
}

pub fn odds_files(raw_dir: &Path, date: NaiveDate) -> Result<Vec<PathBuf>> {
    list_files(raw_dir, "odds_", &format!("_{}.json", date))
}

pub fn standings_files(raw_dir: &Path) -> Result<Vec<PathBuf>> {
    list_files(&raw_dir.join("standings"), "standings_", ".json")
}

pub fn statistics_files(raw_dir: &Path) -> Result<Vec<PathBuf>> {
    list_files(raw_dir, "statistics_", ".json")
}

/// Flatten every fixture found in `files`
pub fn load_fixtures(files: &[PathBuf]) -> Vec<FixtureRow> {
    read_all::<ApiFixture>(files)
        .into_iter()
        .map(FixtureRow::from)
        .collect()
}

/// Map fixture id to its `"Home vs Away"` name
pub fn fixture_names(fixtures: &[FixtureRow]) -> HashMap<u64, String> {
    fixtures
        .iter()
        .map(|f| (f.fixture_id, f.match_name()))
        .collect()
}

/// Map match name to league name
pub fn league_mapping(fixtures: &[FixtureRow]) -> HashMap<String, String> {
    fixtures
        .iter()
        .filter(|f| !f.home.is_empty() && !f.away.is_empty() && !f.league_name.is_empty())
        .map(|f| (f.match_name(), f.league_name.clone()))
        .collect()
}

/// Final results of finished fixtures, keyed by match name
pub fn match_results(fixtures: &[FixtureRow]) -> HashMap<String, Outcome> {
    fixtures
        .iter()
        .filter_map(|f| f.result().map(|outcome| (f.match_name(), outcome)))
        .collect()
}

pub fn load_match_results(files: &[PathBuf]) -> HashMap<String, Outcome> {
    match_results(&load_fixtures(files))
}

/// Extract the bookmaker's 1X2 prices for one fixture
fn match_winner_odds(odds: &ApiOdds, bookmaker: &str) -> Option<MatchOdds> {
    let book = odds.bookmakers.iter().find(|b| b.name == bookmaker)?;
    let market = book.bets.iter().find(|b| b.name == MATCH_WINNER_MARKET)?;

    let (mut home, mut draw, mut away) = (None, None, None);
    for value in &market.values {
        let Ok(price) = value.odd.trim().parse::<f64>() else {
            continue;
        };
        match Outcome::parse(&value.value) {
            Some(Outcome::Home) => home = Some(price),
            Some(Outcome::Draw) => draw = Some(price),
            Some(Outcome::Away) => away = Some(price),
            None => {}
        }
    }

    Some(MatchOdds {
        home: home?,
        draw: draw?,
        away: away?,
    })
}

/// Load complete 1X2 odds for every fixture named in `fixture_names`
pub fn load_match_odds(
    files: &[PathBuf],
    bookmaker: &str,
    fixture_names: &HashMap<u64, String>,
) -> HashMap<String, MatchOdds> {
    let mut all_odds = HashMap::new();
    for entry in read_all::<ApiOdds>(files) {
        let Some(name) = fixture_names.get(&entry.fixture.id) else {
            debug!("Odds for unknown fixture {}", entry.fixture.id);
            continue;
        };
        match match_winner_odds(&entry, bookmaker) {
            Some(odds) => {
                all_odds.insert(name.clone(), odds);
            }
            None => debug!("Incomplete {} odds for {}", bookmaker, name),
        }
    }
    all_odds
}

pub fn load_standings(files: &[PathBuf]) -> Vec<ApiStanding> {
    read_all::<ApiStandingsLeague>(files)
        .into_iter()
        .flat_map(|league| league.league.standings.into_iter().flatten())
        .collect()
}

/// Team statistics grouped per source file
pub fn load_team_statistics(files: &[PathBuf]) -> Vec<Vec<ApiTeamStatistics>> {
    files
        .iter()
        .filter_map(|path| match read_envelope::<ApiTeamStatistics>(path) {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub fn fixture(
        id: u64,
        league: &str,
        home: &str,
        away: &str,
        goals: Option<(u32, u32)>,
        status: &str,
    ) -> Value {
        let (gh, ga) = match goals {
            Some((h, a)) => (json!(h), json!(a)),
            None => (Value::Null, Value::Null),
        };
        json!({
            "fixture": {
                "id": id,
                "date": "2025-08-04T19:00:00+00:00",
                "status": {"short": status}
            },
            "league": {"id": 39, "name": league, "country": "England"},
            "teams": {"home": {"id": 1, "name": home}, "away": {"id": 2, "name": away}},
            "goals": {"home": gh, "away": ga}
        })
    }

    pub fn odds(id: u64, bookmaker: &str, home: &str, draw: &str, away: &str) -> Value {
        json!({
            "fixture": {"id": id},
            "bookmakers": [{
                "id": 8,
                "name": bookmaker,
                "bets": [
                    {"id": 5, "name": "Goals Over/Under", "values": [
                        {"value": "Over 2.5", "odd": "1.90"}
                    ]},
                    {"id": 1, "name": "Match Winner", "values": [
                        {"value": "Home", "odd": home},
                        {"value": "Draw", "odd": draw},
                        {"value": "Away", "odd": away}
                    ]}
                ]
            }]
        })
    }

    pub fn envelope(items: Vec<Value>) -> String {
        json!({"get": "fixtures", "errors": [], "results": items.len(), "response": items})
            .to_string()
    }
}
