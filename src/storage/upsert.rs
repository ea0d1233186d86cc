//! Daily analysis rows.
//!
//! One row per ticker and trading day; a re-run of the same day replaces the
//! earlier reading and keeps its id.

use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;
use crate::market::{DarkPoolAnalysis, OptionFlowAnalysis};

fn day(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Stores an options flow analysis. Returns the row id.
pub async fn upsert_option_flow_analysis(
    pool: &SqlitePool,
    analysis: &OptionFlowAnalysis,
) -> Result<i64, DatabaseError> {
    let id = sqlx::query_scalar(
        "INSERT INTO option_flow_analysis (
             ticker, date, total_call_premium, total_put_premium, call_put_ratio,
             call_sweeps, put_sweeps, sentiment, unusual_call_count, unusual_put_count,
             has_unusual_activity, analyzed_at_ms)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(ticker, date) DO UPDATE SET
             total_call_premium=excluded.total_call_premium,
             total_put_premium=excluded.total_put_premium,
             call_put_ratio=excluded.call_put_ratio,
             call_sweeps=excluded.call_sweeps,
             put_sweeps=excluded.put_sweeps,
             sentiment=excluded.sentiment,
             unusual_call_count=excluded.unusual_call_count,
             unusual_put_count=excluded.unusual_put_count,
             has_unusual_activity=excluded.has_unusual_activity,
             analyzed_at_ms=excluded.analyzed_at_ms
         RETURNING id",
    )
    .bind(&analysis.ticker)
    .bind(day(analysis.date))
    .bind(analysis.total_call_premium)
    .bind(analysis.total_put_premium)
    .bind(analysis.call_put_ratio)
    .bind(analysis.call_sweeps)
    .bind(analysis.put_sweeps)
    .bind(analysis.sentiment.as_ref())
    .bind(analysis.unusual_call_count)
    .bind(analysis.unusual_put_count)
    .bind(analysis.has_unusual_activity)
    .bind(analysis.analyzed_at_ms)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Stores a dark pool analysis. Returns the row id.
pub async fn upsert_dark_pool_analysis(
    pool: &SqlitePool,
    analysis: &DarkPoolAnalysis,
) -> Result<i64, DatabaseError> {
    let id = sqlx::query_scalar(
        "INSERT INTO dark_pool_analysis (
             ticker, date, dark_pool_percentage, dark_pool_volume, total_volume,
             significant_volume, high_percentage, large_block_count, largest_block,
             analyzed_at_ms)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(ticker, date) DO UPDATE SET
             dark_pool_percentage=excluded.dark_pool_percentage,
             dark_pool_volume=excluded.dark_pool_volume,
             total_volume=excluded.total_volume,
             significant_volume=excluded.significant_volume,
             high_percentage=excluded.high_percentage,
             large_block_count=excluded.large_block_count,
             largest_block=excluded.largest_block,
             analyzed_at_ms=excluded.analyzed_at_ms
         RETURNING id",
    )
    .bind(&analysis.ticker)
    .bind(day(analysis.date))
    .bind(analysis.dark_pool_percentage)
    .bind(analysis.dark_pool_volume)
    .bind(analysis.total_volume)
    .bind(analysis.significant_volume)
    .bind(analysis.high_percentage)
    .bind(analysis.large_block_count)
    .bind(analysis.largest_block)
    .bind(analysis.analyzed_at_ms)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Sentiment;
    use crate::storage::test_helpers::create_test_pool;
    use chrono::NaiveDate;
    use sqlx::Row;

    fn flow(ticker: &str, ratio: Option<f64>, sentiment: Sentiment) -> OptionFlowAnalysis {
        OptionFlowAnalysis {
            ticker: ticker.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 21).unwrap(),
            total_call_premium: 250_000.0,
            total_put_premium: 180_000.0,
            call_put_ratio: ratio,
            call_sweeps: 1,
            put_sweeps: 0,
            sentiment,
            unusual_call_count: 1,
            unusual_put_count: 0,
            has_unusual_activity: true,
            max_unusual_premium: 250_000.0,
            analyzed_at_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_option_flow_upsert_replaces_same_day() {
        let pool = create_test_pool().await;

        let first = upsert_option_flow_analysis(&pool, &flow("AAPL", Some(1.39), Sentiment::Neutral))
            .await
            .unwrap();
        let second = upsert_option_flow_analysis(&pool, &flow("AAPL", None, Sentiment::Bullish))
            .await
            .unwrap();
        assert_eq!(first, second);

        let row = sqlx::query("SELECT COUNT(*) AS n, MAX(sentiment) AS s, MAX(call_put_ratio) AS r FROM option_flow_analysis")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("n"), 1);
        assert_eq!(row.get::<String, _>("s"), "bullish");
        assert_eq!(row.get::<Option<f64>, _>("r"), None);
    }

    #[tokio::test]
    async fn test_option_flow_upsert_distinct_tickers() {
        let pool = create_test_pool().await;
        let a = upsert_option_flow_analysis(&pool, &flow("AAPL", Some(1.0), Sentiment::Neutral))
            .await
            .unwrap();
        let b = upsert_option_flow_analysis(&pool, &flow("MSFT", Some(1.0), Sentiment::Neutral))
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_dark_pool_upsert_replaces_same_day() {
        let pool = create_test_pool().await;
        let mut analysis = DarkPoolAnalysis {
            ticker: "TSLA".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 21).unwrap(),
            dark_pool_percentage: 25.0,
            dark_pool_volume: 250_000,
            total_volume: 1_000_000,
            significant_volume: true,
            high_percentage: true,
            large_block_count: 2,
            largest_block: 75_000,
            analyzed_at_ms: 1,
        };
        let first = upsert_dark_pool_analysis(&pool, &analysis).await.unwrap();
        analysis.largest_block = 90_000;
        let second = upsert_dark_pool_analysis(&pool, &analysis).await.unwrap();
        assert_eq!(first, second);

        let largest: i64 = sqlx::query_scalar("SELECT largest_block FROM dark_pool_analysis WHERE id = ?")
            .bind(first)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(largest, 90_000);
    }
}
