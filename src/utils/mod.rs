pub mod backtest;
pub mod data;
pub mod dataset;
pub mod ev_calculator;
pub mod evaluation;
pub mod rankings;
pub mod strategies;
pub mod value_bets;
