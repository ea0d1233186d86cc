//! Technical indicators over close prices.

/// Latest MACD reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Exponential moving average seeded with the simple average of the first
/// `period` values.
///
/// The result starts at input index `period - 1`, so it holds
/// `values.len() - period + 1` points. Empty when there is not enough input.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for value in &values[period..] {
        prev = (value - prev) * k + prev;
        out.push(prev);
    }
    out
}

/// Relative strength index with Wilder smoothing.
///
/// Needs `period + 1` closes. A flat series reads 50; a series with no
/// losses reads 100.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = changes[..period].iter().map(|c| c.max(0.0)).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(|c| (-c).max(0.0)).sum::<f64>() / period as f64;

    let smoothing = (period - 1) as f64;
    for change in &changes[period..] {
        avg_gain = (avg_gain * smoothing + change.max(0.0)) / period as f64;
        avg_loss = (avg_loss * smoothing + (-change).max(0.0)) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// MACD line, signal line and histogram at the latest close.
///
/// Needs `slow + signal - 1` closes.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if fast == 0 || slow <= fast || signal == 0 {
        return None;
    }

    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);
    if slow_ema.is_empty() {
        return None;
    }

    // fast_ema starts (slow - fast) closes earlier than slow_ema.
    let offset = slow - fast;
    let macd_line: Vec<f64> = slow_ema
        .iter()
        .zip(&fast_ema[offset..])
        .map(|(slow_value, fast_value)| fast_value - slow_value)
        .collect();

    let signal_line = ema(&macd_line, signal);
    let (&macd_value, &signal_value) = (macd_line.last()?, signal_line.last()?);

    Some(Macd {
        macd: macd_value,
        signal: signal_value,
        histogram: macd_value - signal_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_enough(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ema_seed_and_step() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let out = ema(&values, 3);
        assert_eq!(out.len(), 2);
        assert!(close_enough(out[0], 2.0));
        // k = 0.5: (4 - 2) * 0.5 + 2
        assert!(close_enough(out[1], 3.0));
    }

    #[test]
    fn test_ema_insufficient_input() {
        assert!(ema(&[1.0, 2.0], 3).is_empty());
        assert!(ema(&[1.0], 0).is_empty());
    }

    #[test]
    fn test_rsi_needs_period_plus_one() {
        let closes: Vec<f64> = (0..14).map(|i| i as f64).collect();
        assert_eq!(rsi(&closes, 14), None);
    }

    #[test]
    fn test_rsi_extremes() {
        let rising: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert_eq!(rsi(&rising, 14), Some(100.0));

        let flat = vec![10.0; 20];
        assert_eq!(rsi(&flat, 14), Some(50.0));

        let falling: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert!(close_enough(rsi(&falling, 14).unwrap(), 0.0));
    }

    #[test]
    fn test_rsi_balanced_moves_read_fifty() {
        // Alternating +1 / -1 over an even window.
        let closes: Vec<f64> = (0..15).map(|i| if i % 2 == 0 { 10.0 } else { 11.0 }).collect();
        let value = rsi(&closes, 14).unwrap();
        assert!(close_enough(value, 50.0), "got {value}");
    }

    #[test]
    fn test_macd_needs_slow_plus_signal_minus_one() {
        let closes: Vec<f64> = (0..33).map(|i| i as f64).collect();
        assert_eq!(macd(&closes, 12, 26, 9), None);
        let closes: Vec<f64> = (0..34).map(|i| i as f64).collect();
        assert!(macd(&closes, 12, 26, 9).is_some());
    }

    #[test]
    fn test_macd_of_linear_series() {
        // On a straight line both EMAs lag by a constant, so MACD settles
        // at (slow - fast) / 2 and the histogram at zero.
        let closes: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let reading = macd(&closes, 12, 26, 9).unwrap();
        assert!((reading.macd - 7.0).abs() < 1e-6, "macd {}", reading.macd);
        assert!(reading.histogram.abs() < 1e-6);
    }

    #[test]
    fn test_macd_rejects_bad_periods() {
        let closes = vec![1.0; 100];
        assert_eq!(macd(&closes, 26, 12, 9), None);
        assert_eq!(macd(&closes, 0, 26, 9), None);
    }
}
