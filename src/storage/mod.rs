// storage/mod.rs
// Database operations module

pub mod bulk;
pub mod import;
pub mod migrations;
pub mod models;
pub mod pool;
mod query;
pub mod run;
pub mod tables;
pub mod upsert;
pub mod users;
pub mod writer;

#[cfg(test)]
pub mod test_helpers;

// Re-export commonly used items
pub use bulk::{
    bulk_insert, BulkInsertOptions, BulkInsertReport, BulkInserter, BulkLogger, BulkWriter,
    ChunkFailure, LogFacade, Table,
};
pub use import::{import_jsonl, ImportSummary, ImportTable};
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use run::{insert_job_run, query_job_history, update_job_run_stats, JobRunSummary};
pub use tables::{
    DarkPoolPrintsTable, NotificationsTable, OptionFlowTradesTable, SqliteTable,
    StockUpdatesTable, WatchlistTable,
};
pub use upsert::{upsert_dark_pool_analysis, upsert_option_flow_analysis};
pub use writer::SqliteWriter;
