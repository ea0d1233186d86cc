//! Simulated market data feed.
//!
//! Output is deterministic for a given ticker and trading date: the same
//! inputs always produce the same bars and prints.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{normalize_ticker, MARKET_CLOSE_HOUR, MARKET_CLOSE_MINUTE, MARKET_OPEN_HOUR, MARKET_OPEN_MINUTE};
use crate::error_handling::SourceError;
use crate::market::hours::{eastern_offset, to_eastern, trading_date};
use crate::market::{Bar, DarkPoolBlock, DarkPoolSnapshot, OptionFlowSnapshot};
use crate::sources::MarketDataSource;
use crate::storage::models::{ContractType, NewOptionFlowTrade};

const BAR_MINUTES: i64 = 5;

/// Deterministic simulated feed.
#[derive(Debug, Clone, Default)]
pub struct DemoSource {
    unavailable: HashSet<String>,
}

impl DemoSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every fetch for these tickers fail with [`SourceError::Unavailable`].
    pub fn with_unavailable<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.unavailable
            .extend(tickers.into_iter().map(|t| normalize_ticker(t.as_ref())));
        self
    }

    fn check(&self, ticker: &str) -> Result<(), SourceError> {
        if self.unavailable.contains(&normalize_ticker(ticker)) {
            return Err(SourceError::Unavailable {
                ticker: ticker.to_string(),
                reason: "simulated outage".to_string(),
            });
        }
        Ok(())
    }

    fn rng(ticker: &str, at: DateTime<Utc>) -> StdRng {
        let day = trading_date(at).num_days_from_ce() as u64;
        let seed = ticker
            .bytes()
            .fold(day, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
        StdRng::seed_from_u64(seed)
    }

    /// Session open and close on the trading date of `at`, in UTC.
    fn session(at: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let date = trading_date(at);
        let offset = eastern_offset(at);
        let open = NaiveTime::from_hms_opt(MARKET_OPEN_HOUR, MARKET_OPEN_MINUTE, 0)?;
        let close = NaiveTime::from_hms_opt(MARKET_CLOSE_HOUR, MARKET_CLOSE_MINUTE, 0)?;
        let open = offset.from_local_datetime(&date.and_time(open)).single()?;
        let close = offset.from_local_datetime(&date.and_time(close)).single()?;
        Some((open.with_timezone(&Utc), close.with_timezone(&Utc)))
    }

    fn bars(ticker: &str, at: DateTime<Utc>) -> Vec<Bar> {
        let Some((open, close)) = Self::session(at) else {
            return Vec::new();
        };
        let end = at.min(close);
        if end < open {
            return Vec::new();
        }

        let mut rng = Self::rng(ticker, at);
        let count = (end - open).num_minutes() / BAR_MINUTES + 1;
        let mut price = 50.0 + f64::from(rng.random_range(0..400u32));

        (0..count)
            .map(|i| {
                let bar_open = price;
                let close = bar_open * (1.0 + rng.random_range(-0.005..0.005));
                let wick = bar_open.max(close) * rng.random_range(0.0..0.002);
                price = close;
                Bar {
                    timestamp_ms: (open + Duration::minutes(i * BAR_MINUTES)).timestamp_millis(),
                    open: bar_open,
                    high: bar_open.max(close) + wick,
                    low: bar_open.min(close) - wick,
                    close,
                    volume: rng.random_range(1_000..50_000),
                }
            })
            .collect()
    }
}

impl MarketDataSource for DemoSource {
    async fn fetch_intraday(&self, ticker: &str, at: DateTime<Utc>) -> Result<Vec<Bar>, SourceError> {
        self.check(ticker)?;
        let bars = Self::bars(ticker, at);
        if bars.is_empty() {
            return Err(SourceError::NoData {
                ticker: ticker.to_string(),
            });
        }
        Ok(bars)
    }

    async fn fetch_option_flow(
        &self,
        ticker: &str,
        at: DateTime<Utc>,
    ) -> Result<OptionFlowSnapshot, SourceError> {
        self.check(ticker)?;
        let date = trading_date(at);
        let expiry_date = (date + Duration::days(30)).format("%Y-%m-%d").to_string();
        let current_price = 100.0;

        let trades = vec![
            NewOptionFlowTrade {
                ticker: ticker.to_string(),
                contract_type: ContractType::Call,
                strike_price: current_price + 5.0,
                expiry_date: expiry_date.clone(),
                premium: 250_000.0,
                contract_size: 500,
                implied_volatility: 0.35,
                traded_at_ms: (at - Duration::hours(3)).timestamp_millis(),
                is_sweep: true,
                is_opening_position: true,
            },
            NewOptionFlowTrade {
                ticker: ticker.to_string(),
                contract_type: ContractType::Put,
                strike_price: current_price - 10.0,
                expiry_date,
                premium: 180_000.0,
                contract_size: 300,
                implied_volatility: 0.40,
                traded_at_ms: (at - Duration::hours(1)).timestamp_millis(),
                is_sweep: false,
                is_opening_position: true,
            },
        ];

        Ok(OptionFlowSnapshot {
            ticker: ticker.to_string(),
            date,
            current_price,
            trades,
        })
    }

    async fn fetch_dark_pool(&self, ticker: &str, at: DateTime<Utc>) -> Result<DarkPoolSnapshot, SourceError> {
        self.check(ticker)?;
        let print_time = |hours_ago: i64| {
            to_eastern(at - Duration::hours(hours_ago))
                .format("%H:%M:%S")
                .to_string()
        };

        Ok(DarkPoolSnapshot {
            ticker: ticker.to_string(),
            date: trading_date(at),
            total_volume: 1_000_000,
            dark_pool_volume: 250_000,
            blocks: vec![
                DarkPoolBlock {
                    print_time: print_time(2),
                    price: 150.25,
                    volume: 50_000,
                },
                DarkPoolBlock {
                    print_time: print_time(1),
                    price: 151.30,
                    volume: 75_000,
                },
            ],
        })
    }
}
