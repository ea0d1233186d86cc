//! Dark pool analysis.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::{HIGH_DARK_PERCENTAGE, LARGE_BLOCK_VOLUME, SIGNIFICANT_DARK_VOLUME};
use crate::storage::models::NewDarkPoolPrint;

/// A single off-exchange block print.
#[derive(Debug, Clone, PartialEq)]
pub struct DarkPoolBlock {
    /// `HH:MM:SS`, exchange local time
    pub print_time: String,
    pub price: f64,
    pub volume: i64,
}

/// Dark pool activity for one ticker and trading day, as delivered by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct DarkPoolSnapshot {
    pub ticker: String,
    pub date: NaiveDate,
    pub total_volume: i64,
    pub dark_pool_volume: i64,
    pub blocks: Vec<DarkPoolBlock>,
}

impl DarkPoolSnapshot {
    /// Block prints as `dark_pool_prints` records.
    pub fn prints(&self) -> Vec<NewDarkPoolPrint> {
        let date = self.date.format("%Y-%m-%d").to_string();
        self.blocks
            .iter()
            .map(|block| NewDarkPoolPrint {
                ticker: self.ticker.clone(),
                date: date.clone(),
                print_time: block.print_time.clone(),
                price: block.price,
                volume: block.volume,
            })
            .collect()
    }
}

/// Aggregated dark pool activity (`dark_pool_analysis`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DarkPoolAnalysis {
    pub ticker: String,
    pub date: NaiveDate,
    pub dark_pool_percentage: f64,
    pub dark_pool_volume: i64,
    pub total_volume: i64,
    pub significant_volume: bool,
    pub high_percentage: bool,
    pub large_block_count: i64,
    pub largest_block: i64,
    pub analyzed_at_ms: i64,
}

impl DarkPoolAnalysis {
    /// Significant volume that is also a high share of the tape.
    pub fn is_unusual(&self) -> bool {
        self.significant_volume && self.high_percentage
    }
}

pub fn analyze_dark_pool(snapshot: &DarkPoolSnapshot, analyzed_at_ms: i64) -> DarkPoolAnalysis {
    let dark_pool_percentage = if snapshot.total_volume > 0 {
        snapshot.dark_pool_volume as f64 / snapshot.total_volume as f64 * 100.0
    } else {
        0.0
    };

    let large_block_count = snapshot
        .blocks
        .iter()
        .filter(|block| block.volume > LARGE_BLOCK_VOLUME)
        .count() as i64;
    let largest_block = snapshot
        .blocks
        .iter()
        .map(|block| block.volume)
        .max()
        .unwrap_or(0);

    DarkPoolAnalysis {
        ticker: snapshot.ticker.clone(),
        date: snapshot.date,
        dark_pool_percentage,
        dark_pool_volume: snapshot.dark_pool_volume,
        total_volume: snapshot.total_volume,
        significant_volume: snapshot.dark_pool_volume > SIGNIFICANT_DARK_VOLUME,
        high_percentage: dark_pool_percentage > HIGH_DARK_PERCENTAGE,
        large_block_count,
        largest_block,
        analyzed_at_ms,
    }
}
