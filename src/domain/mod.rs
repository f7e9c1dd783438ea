//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod indicator_helpers;
pub mod snapshot;
pub mod scoring;
pub mod rule_parser;
pub mod signal;
pub mod backtest;
pub mod metrics;
pub mod universe;
pub mod pipeline;
pub mod config;
pub mod config_validation;
pub mod error;
