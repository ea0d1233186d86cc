//! Intraday bars and the quote snapshot built from them.

use serde::{Deserialize, Serialize};

use crate::config::{MACD_FAST_PERIOD, MACD_SIGNAL_PERIOD, MACD_SLOW_PERIOD, RSI_PERIOD};
use crate::market::indicators::{macd, rsi};
use crate::storage::models::NewStockUpdate;

/// One OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Builds a `stock_updates` record from a day's bars, oldest first.
///
/// Price and volume come from the last bar; change is measured from the
/// first open.
/// Indicators are left empty when there are too few bars for them.
/// Returns `None` when there are no bars.
pub fn quote_snapshot(ticker: &str, bars: &[Bar]) -> Option<NewStockUpdate> {
    let first = bars.first()?;
    let last = bars.last()?;

    let change_percent = if first.open != 0.0 {
        (last.close - first.open) / first.open * 100.0
    } else {
        0.0
    };

    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    let macd_reading = macd(&closes, MACD_FAST_PERIOD, MACD_SLOW_PERIOD, MACD_SIGNAL_PERIOD);

    Some(NewStockUpdate {
        ticker: ticker.to_string(),
        price: last.close,
        change_percent,
        volume: last.volume,
        rsi: rsi(&closes, RSI_PERIOD),
        macd: macd_reading.map(|m| m.macd),
        macd_signal: macd_reading.map(|m| m.signal),
        macd_histogram: macd_reading.map(|m| m.histogram),
        observed_at_ms: last.timestamp_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: i64, open: f64, close: f64) -> Bar {
        Bar {
            timestamp_ms: 1_700_000_000_000 + i * 60_000,
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 1_000 + i,
        }
    }

    #[test]
    fn test_no_bars_no_snapshot() {
        assert_eq!(quote_snapshot("AAPL", &[]), None);
    }

    #[test]
    fn test_short_day_has_price_but_no_indicators() {
        let bars = vec![bar(0, 100.0, 101.0), bar(1, 101.0, 102.0)];
        let update = quote_snapshot("AAPL", &bars).unwrap();
        assert_eq!(update.price, 102.0);
        assert!((update.change_percent - 2.0).abs() < 1e-9);
        assert_eq!(update.volume, 1_001);
        assert_eq!(update.observed_at_ms, bars[1].timestamp_ms);
        assert_eq!(update.rsi, None);
        assert_eq!(update.macd, None);
    }

    #[test]
    fn test_long_day_fills_indicators() {
        let bars: Vec<Bar> = (0..60)
            .map(|i| bar(i, 100.0 + i as f64, 100.5 + i as f64))
            .collect();
        let update = quote_snapshot("msft", &bars).unwrap();
        assert_eq!(update.ticker, "msft");
        assert_eq!(update.rsi, Some(100.0));
        let (macd, signal, hist) = (
            update.macd.unwrap(),
            update.macd_signal.unwrap(),
            update.macd_histogram.unwrap(),
        );
        assert!((macd - signal - hist).abs() < 1e-9);
    }

    #[test]
    fn test_zero_open_reports_flat_change() {
        let update = quote_snapshot("X", &[bar(0, 0.0, 5.0)]).unwrap();
        assert_eq!(update.change_percent, 0.0);
    }
}
