pub mod analysis;
pub mod api;
pub mod config;
pub mod models;
pub mod report;
pub mod simulation;
pub mod tracker;
pub mod utils;

pub use api::*;
pub use models::*;
pub use utils::*;

pub use analysis::{DailyAnalysis, ProbabilitySource, RankingInput};
pub use config::{DataPaths, Settings};
pub use report::{run_daily, DailyOptions, DailyReport, DailyRun};
pub use simulation::{create_demo_history, DemoSummary};
pub use tracker::{
    AddBetsOutcome, BettingTracker, LeagueStatistics, LedgerError, RecentPerformance,
    SettleOutcome, Staking, Statistics,
};
