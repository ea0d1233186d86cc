//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (batch sizes, intervals, thresholds)
//! - Library configuration and CLI option types

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{
    default_tickers, normalize_ticker, parse_ticker_list, Config, LogFormat, LogLevel,
};
