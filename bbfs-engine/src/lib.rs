pub mod analysis;
pub mod backtest;
pub mod config;
pub mod display;
pub mod engine;
pub mod patterns;
pub mod rules;
pub mod strategies;
pub mod streaks;
