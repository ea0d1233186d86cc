//! Options flow analysis.
//!
//! Aggregates a day's flow prints for one ticker into premium totals, a
//! call/put ratio, a sentiment reading and a count of unusual prints.

use chrono::NaiveDate;
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::config::{
    BEARISH_RATIO, BULLISH_RATIO, HIGH_IV_THRESHOLD, LARGE_PREMIUM_THRESHOLD,
};
use crate::storage::models::{ContractType, NewOptionFlowTrade};

/// Flow prints for one ticker and trading day, as delivered by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionFlowSnapshot {
    pub ticker: String,
    pub date: NaiveDate,
    pub current_price: f64,
    pub trades: Vec<NewOptionFlowTrade>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

/// Aggregated flow for one ticker and day (`option_flow_analysis`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionFlowAnalysis {
    pub ticker: String,
    pub date: NaiveDate,
    pub total_call_premium: f64,
    pub total_put_premium: f64,
    /// Absent when no put premium traded.
    pub call_put_ratio: Option<f64>,
    pub call_sweeps: i64,
    pub put_sweeps: i64,
    pub sentiment: Sentiment,
    pub unusual_call_count: i64,
    pub unusual_put_count: i64,
    pub has_unusual_activity: bool,
    /// Largest premium among unusual prints (0 when there are none).
    pub max_unusual_premium: f64,
    pub analyzed_at_ms: i64,
}

/// A print is unusual when its premium or its implied volatility is large.
pub fn is_unusual_trade(trade: &NewOptionFlowTrade) -> bool {
    trade.premium > LARGE_PREMIUM_THRESHOLD || trade.implied_volatility > HIGH_IV_THRESHOLD
}

fn sentiment_for(total_call_premium: f64, call_put_ratio: Option<f64>) -> Sentiment {
    match call_put_ratio {
        Some(ratio) if ratio > BULLISH_RATIO => Sentiment::Bullish,
        Some(ratio) if ratio < BEARISH_RATIO => Sentiment::Bearish,
        Some(_) => Sentiment::Neutral,
        None if total_call_premium > 0.0 => Sentiment::Bullish,
        None => Sentiment::Neutral,
    }
}

/// Analyzes a snapshot. Returns `None` when it holds no prints.
pub fn analyze_option_flow(
    snapshot: &OptionFlowSnapshot,
    analyzed_at_ms: i64,
) -> Option<OptionFlowAnalysis> {
    if snapshot.trades.is_empty() {
        return None;
    }

    let mut total_call_premium = 0.0;
    let mut total_put_premium = 0.0;
    let mut call_sweeps = 0;
    let mut put_sweeps = 0;
    let mut unusual_call_count = 0;
    let mut unusual_put_count = 0;
    let mut max_unusual_premium: f64 = 0.0;

    for trade in &snapshot.trades {
        let unusual = is_unusual_trade(trade);
        if unusual {
            max_unusual_premium = max_unusual_premium.max(trade.premium);
        }
        match trade.contract_type {
            ContractType::Call => {
                total_call_premium += trade.premium;
                call_sweeps += i64::from(trade.is_sweep);
                unusual_call_count += i64::from(unusual);
            }
            ContractType::Put => {
                total_put_premium += trade.premium;
                put_sweeps += i64::from(trade.is_sweep);
                unusual_put_count += i64::from(unusual);
            }
        }
    }

    let call_put_ratio = if total_put_premium > 0.0 {
        Some(total_call_premium / total_put_premium)
    } else {
        None
    };

    Some(OptionFlowAnalysis {
        ticker: snapshot.ticker.clone(),
        date: snapshot.date,
        total_call_premium,
        total_put_premium,
        call_put_ratio,
        call_sweeps,
        put_sweeps,
        sentiment: sentiment_for(total_call_premium, call_put_ratio),
        unusual_call_count,
        unusual_put_count,
        has_unusual_activity: unusual_call_count > 0 || unusual_put_count > 0,
        max_unusual_premium,
        analyzed_at_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(contract_type: ContractType, premium: f64, iv: f64, is_sweep: bool) -> NewOptionFlowTrade {
        NewOptionFlowTrade {
            ticker: "AAPL".to_string(),
            contract_type,
            strike_price: 105.0,
            expiry_date: "2025-02-21".to_string(),
            premium,
            contract_size: 100,
            implied_volatility: iv,
            traded_at_ms: 1_704_067_200_000,
            is_sweep,
            is_opening_position: true,
        }
    }

    fn snapshot(trades: Vec<NewOptionFlowTrade>) -> OptionFlowSnapshot {
        OptionFlowSnapshot {
            ticker: "AAPL".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 21).unwrap(),
            current_price: 100.0,
            trades,
        }
    }

    #[test]
    fn test_empty_flow_has_no_analysis() {
        assert_eq!(analyze_option_flow(&snapshot(vec![]), 0), None);
    }

    #[test]
    fn test_sample_flow_reads_neutral_with_one_unusual_call() {
        // Same shape as the demo feed: one sweeping call, one plain put.
        let analysis = analyze_option_flow(
            &snapshot(vec![
                trade(ContractType::Call, 250_000.0, 0.35, true),
                trade(ContractType::Put, 180_000.0, 0.40, false),
            ]),
            42,
        )
        .unwrap();

        assert_eq!(analysis.total_call_premium, 250_000.0);
        assert_eq!(analysis.total_put_premium, 180_000.0);
        let ratio = analysis.call_put_ratio.unwrap();
        assert!((ratio - 1.3888).abs() < 1e-3);
        assert_eq!(analysis.sentiment, Sentiment::Neutral);
        assert_eq!(analysis.call_sweeps, 1);
        assert_eq!(analysis.put_sweeps, 0);
        assert_eq!(analysis.unusual_call_count, 1);
        assert_eq!(analysis.unusual_put_count, 0);
        assert!(analysis.has_unusual_activity);
        assert_eq!(analysis.max_unusual_premium, 250_000.0);
        assert_eq!(analysis.analyzed_at_ms, 42);
    }

    #[test]
    fn test_analysis_serializes_with_iso_date() {
        let analysis = analyze_option_flow(
            &snapshot(vec![trade(ContractType::Call, 250_000.0, 0.35, true)]),
            0,
        )
        .unwrap();
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["date"], "2025-01-21");
        assert_eq!(json["sentiment"], "bullish");
        assert_eq!(json["call_put_ratio"], serde_json::Value::Null);
    }

    #[test]
    fn test_sentiment_thresholds() {
        let bullish = analyze_option_flow(
            &snapshot(vec![
                trade(ContractType::Call, 30_000.0, 0.2, false),
                trade(ContractType::Put, 10_000.0, 0.2, false),
            ]),
            0,
        )
        .unwrap();
        assert_eq!(bullish.sentiment, Sentiment::Bullish);

        let bearish = analyze_option_flow(
            &snapshot(vec![
                trade(ContractType::Call, 4_000.0, 0.2, false),
                trade(ContractType::Put, 10_000.0, 0.2, false),
            ]),
            0,
        )
        .unwrap();
        assert_eq!(bearish.sentiment, Sentiment::Bearish);

        // Exactly 2.0 is not strictly greater than the bullish cut-off.
        let boundary = analyze_option_flow(
            &snapshot(vec![
                trade(ContractType::Call, 20_000.0, 0.2, false),
                trade(ContractType::Put, 10_000.0, 0.2, false),
            ]),
            0,
        )
        .unwrap();
        assert_eq!(boundary.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_calls_only_have_no_ratio_and_read_bullish() {
        let analysis = analyze_option_flow(
            &snapshot(vec![trade(ContractType::Call, 5_000.0, 0.2, false)]),
            0,
        )
        .unwrap();
        assert_eq!(analysis.call_put_ratio, None);
        assert_eq!(analysis.sentiment, Sentiment::Bullish);
        assert!(!analysis.has_unusual_activity);
    }

    #[test]
    fn test_high_iv_put_is_unusual() {
        let analysis = analyze_option_flow(
            &snapshot(vec![trade(ContractType::Put, 1_000.0, 0.9, true)]),
            0,
        )
        .unwrap();
        assert_eq!(analysis.unusual_put_count, 1);
        assert_eq!(analysis.put_sweeps, 1);
        assert_eq!(analysis.max_unusual_premium, 1_000.0);
        assert_eq!(analysis.sentiment, Sentiment::Bearish);
    }
}
