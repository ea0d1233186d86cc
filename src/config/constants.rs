//! Configuration constants.
//!
//! This module defines the defaults and thresholds used throughout the pipeline:
//! batch sizes, job intervals, market session bounds and analysis cut-offs.

use std::time::Duration;

pub const DB_PATH: &str = "./fund_pipeline.db";

// Bulk insert
/// Default number of records written per insert statement.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Host parameter limit of the bundled SQLite (`SQLITE_MAX_VARIABLE_NUMBER`).
/// Caps the effective batch size at this many bound values per statement.
pub const SQLITE_MAX_VARIABLES: usize = 32_766;

// Ticker universe
/// Tickers tracked when `TRACKED_TICKERS` is not set.
pub const DEFAULT_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "AMZN", "GOOG", "META", "NVDA", "TSLA", "AMD", "JPM", "BAC",
];
/// Environment variable holding a comma-separated ticker list.
pub const TRACKED_TICKERS_ENV: &str = "TRACKED_TICKERS";
/// How long the resolved ticker universe (configured + watched) is reused.
pub const TICKER_UNIVERSE_TTL: Duration = Duration::from_secs(5 * 60);

// Job schedule
/// Market data snapshot every 15 minutes during trading hours.
pub const MARKET_DATA_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// Options flow every 2 hours.
pub const OPTION_FLOW_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);
/// Dark pool every 2 hours.
pub const DARK_POOL_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);
/// How often the scheduler wakes up to look for due jobs.
pub const SCHEDULER_TICK: Duration = Duration::from_secs(30);
/// Pause between tickers inside a job (provider rate limiting).
pub const DEFAULT_TICKER_PAUSE_MS: u64 = 1000;

// Market session (America/New_York local time)
pub const MARKET_OPEN_HOUR: u32 = 9;
pub const MARKET_OPEN_MINUTE: u32 = 30;
pub const MARKET_CLOSE_HOUR: u32 = 16;
pub const MARKET_CLOSE_MINUTE: u32 = 0;

// Indicators
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST_PERIOD: usize = 12;
pub const MACD_SLOW_PERIOD: usize = 26;
pub const MACD_SIGNAL_PERIOD: usize = 9;

// Options flow analysis
/// Call/put premium ratio above which flow reads bullish.
pub const BULLISH_RATIO: f64 = 2.0;
/// Call/put premium ratio below which flow reads bearish.
pub const BEARISH_RATIO: f64 = 0.5;
/// Premium (USD) above which a single print counts as unusual.
pub const LARGE_PREMIUM_THRESHOLD: f64 = 200_000.0;
/// Implied volatility above which a single print counts as unusual.
pub const HIGH_IV_THRESHOLD: f64 = 0.5;

// Dark pool analysis
/// Dark pool volume above which activity is significant.
pub const SIGNIFICANT_DARK_VOLUME: i64 = 100_000;
/// Dark pool share of total volume (percent) above which activity is high.
pub const HIGH_DARK_PERCENTAGE: f64 = 20.0;
/// Volume above which a single print is a block trade.
pub const LARGE_BLOCK_VOLUME: i64 = 25_000;

// Error message limits
/// Maximum chunk failure message length stored in reports.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 2000;
