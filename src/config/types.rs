//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{
    DB_PATH, DEFAULT_BATCH_SIZE, DEFAULT_TICKERS, DEFAULT_TICKER_PAUSE_MS, TRACKED_TICKERS_ENV,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use fund_pipeline::Config;
///
/// let config = Config {
///     tickers: vec!["AAPL".to_string(), "NVDA".to_string()],
///     respect_market_hours: false,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    pub db_path: PathBuf,

    /// Tickers tracked regardless of watchlists
    pub tickers: Vec<String>,

    /// Records per insert statement for bulk writes
    pub batch_size: usize,

    /// Keep writing later chunks when one chunk of a bulk write fails
    pub continue_on_error: bool,

    /// Only run jobs during the regular US equity session
    pub respect_market_hours: bool,

    /// Pause between tickers inside a job
    pub ticker_pause_ms: u64,
}

impl Config {
    /// Pause between tickers as a `Duration`.
    pub fn ticker_pause(&self) -> Duration {
        Duration::from_millis(self.ticker_pause_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            db_path: PathBuf::from(DB_PATH),
            tickers: default_tickers(),
            batch_size: DEFAULT_BATCH_SIZE,
            continue_on_error: true,
            respect_market_hours: true,
            ticker_pause_ms: DEFAULT_TICKER_PAUSE_MS,
        }
    }
}

/// Tickers from `TRACKED_TICKERS`, falling back to the built-in list.
pub fn default_tickers() -> Vec<String> {
    match std::env::var(TRACKED_TICKERS_ENV) {
        Ok(value) => {
            let parsed = parse_ticker_list(&value);
            if parsed.is_empty() {
                builtin_tickers()
            } else {
                parsed
            }
        }
        Err(_) => builtin_tickers(),
    }
}

fn builtin_tickers() -> Vec<String> {
    DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect()
}

/// Normalizes a ticker symbol: trimmed and upper-cased.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_ascii_uppercase()
}

/// Parses a comma-separated ticker list, dropping blanks and duplicates
/// while keeping first-seen order.
pub fn parse_ticker_list(value: &str) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for raw in value.split(',') {
        let ticker = normalize_ticker(raw);
        if !ticker.is_empty() && !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }
    tickers
}
