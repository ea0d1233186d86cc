//! Market data sources.
//!
//! Jobs pull intraday bars, options flow and dark pool prints through
//! [`MarketDataSource`]. The shipped implementation is [`DemoSource`], which
//! simulates a feed; vendor clients plug in behind the same trait.

mod demo;

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error_handling::SourceError;
use crate::market::{Bar, DarkPoolSnapshot, OptionFlowSnapshot};

pub use demo::DemoSource;

/// A provider of per-ticker market data as of a point in time.
pub trait MarketDataSource {
    /// The trading session's bars up to `at`, oldest first.
    fn fetch_intraday(
        &self,
        ticker: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Bar>, SourceError>> + Send;

    fn fetch_option_flow(
        &self,
        ticker: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<OptionFlowSnapshot, SourceError>> + Send;

    fn fetch_dark_pool(
        &self,
        ticker: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<DarkPoolSnapshot, SourceError>> + Send;
}
