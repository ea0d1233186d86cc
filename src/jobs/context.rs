//! Shared state handed to every job.

use std::sync::Mutex;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::cache::TtlCache;
use crate::config::{Config, TICKER_UNIVERSE_TTL};
use crate::error_handling::{DatabaseError, ProcessingStats};
use crate::notify::LogNotifier;
use crate::storage::users::watched_tickers;
use crate::storage::SqliteWriter;

const UNIVERSE_KEY: &str = "tickers";

/// Database handles, data source, notifier and configuration for the jobs.
pub struct JobContext<S, N = LogNotifier> {
    pub(crate) pool: SqlitePool,
    pub(crate) writer: SqliteWriter,
    pub(crate) source: S,
    pub(crate) notifier: N,
    pub(crate) config: Config,
    pub(crate) stats: ProcessingStats,
    universe: Mutex<TtlCache<&'static str, Vec<String>>>,
    cancel: CancellationToken,
}

impl<S, N> JobContext<S, N> {
    pub fn new(pool: SqlitePool, source: S, notifier: N, config: Config) -> Self {
        Self {
            writer: SqliteWriter::new(pool.clone()),
            pool,
            source,
            notifier,
            config,
            stats: ProcessingStats::new(),
            universe: Mutex::new(TtlCache::new(TICKER_UNIVERSE_TTL)),
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `token` to stop the scheduler and in-flight jobs.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Configured tickers followed by every watched ticker not already
    /// configured. Cached for a few minutes.
    pub async fn ticker_universe(&self) -> Result<Vec<String>, DatabaseError> {
        if let Some(cached) = self.cached_universe() {
            return Ok(cached);
        }

        let mut tickers = self.config.tickers.clone();
        for ticker in watched_tickers(&self.pool).await? {
            if !tickers.contains(&ticker) {
                tickers.push(ticker);
            }
        }

        if let Ok(mut cache) = self.universe.lock() {
            cache.insert(UNIVERSE_KEY, tickers.clone());
        }
        log::debug!("Ticker universe: {}", tickers.join(","));
        Ok(tickers)
    }

    /// Forces the next `ticker_universe` call to reload watchlists.
    pub fn invalidate_universe(&self) {
        if let Ok(mut cache) = self.universe.lock() {
            cache.clear();
        }
    }

    fn cached_universe(&self) -> Option<Vec<String>> {
        self.universe.lock().ok()?.get(&UNIVERSE_KEY)
    }
}
