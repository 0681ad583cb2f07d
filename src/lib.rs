pub mod backtest;
pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod discovery;
pub mod math;
pub mod observability;
pub mod recording;
pub mod types;
