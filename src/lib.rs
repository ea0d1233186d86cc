//! fund_pipeline library: market data polling with batched bulk inserts
//!
//! This library polls market data for a universe of tickers, stores raw rows
//! in SQLite through a chunked bulk insert that can continue past a failed
//! chunk, upserts daily options flow and dark pool analyses, and queues alerts
//! for users watching a ticker.
//!
//! # Example
//!
//! ```no_run
//! use fund_pipeline::storage::{bulk_insert, init_db_pool_with_path, run_migrations, SqliteWriter, WatchlistTable};
//! use fund_pipeline::storage::models::NewWatchlistEntry;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = init_db_pool_with_path(std::path::Path::new("./fund_pipeline.db")).await?;
//! run_migrations(&pool).await?;
//!
//! let writer = SqliteWriter::new(pool.as_ref().clone());
//! let entries = vec![
//!     NewWatchlistEntry::new("alice", "AAPL"),
//!     NewWatchlistEntry::new("alice", "NVDA"),
//! ];
//! let rows = bulk_insert(&writer, &WatchlistTable, &entries, 100, true).await?;
//! println!("Stored {} watchlist entries", rows.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod cache;
pub mod config;
pub mod error_handling;
pub mod initialization;
pub mod jobs;
pub mod market;
pub mod notify;
pub mod sources;
pub mod storage;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use jobs::{run_once, run_scheduler, JobContext, JobKind, JobReport};
pub use storage::{
    bulk_insert, query_job_history, run_migrations, BulkInsertOptions, BulkInsertReport,
    BulkInserter, ChunkFailure, JobRunSummary,
};
