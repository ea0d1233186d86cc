//! Market rules: trading hours, indicators and the flow analyses.

pub mod dark_pool;
pub mod hours;
pub mod indicators;
pub mod option_flow;
pub mod quotes;

pub use dark_pool::{analyze_dark_pool, DarkPoolAnalysis, DarkPoolBlock, DarkPoolSnapshot};
pub use hours::{is_market_open, trading_date};
pub use option_flow::{analyze_option_flow, OptionFlowAnalysis, OptionFlowSnapshot, Sentiment};
pub use quotes::{quote_snapshot, Bar};
