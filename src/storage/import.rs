//! JSONL import straight into the bulk insert.
//!
//! One JSON object per line. Blank lines and lines starting with `#` are
//! skipped. Every line is parsed before anything is written, so a malformed
//! line aborts the import with no rows stored.

use std::path::Path;

use clap::ValueEnum;
use serde::de::DeserializeOwned;

use crate::error_handling::ImportError;
use crate::storage::bulk::{BulkInsertOptions, BulkInserter, ChunkFailure};
use crate::storage::tables::{
    DarkPoolPrintsTable, NotificationsTable, OptionFlowTradesTable, SqliteTable,
    StockUpdatesTable, WatchlistTable,
};
use crate::storage::writer::SqliteWriter;

/// Tables that accept imports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ImportTable {
    StockUpdates,
    OptionFlowTrades,
    DarkPoolPrints,
    Watchlists,
    Notifications,
}

/// Outcome of an import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub table: String,
    pub submitted: usize,
    pub inserted: usize,
    pub failed_chunks: Vec<ChunkFailure>,
}

/// Parses JSONL into records. Line numbers in errors are 1-based.
pub fn parse_jsonl<R: DeserializeOwned>(contents: &str) -> Result<Vec<R>, ImportError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| ImportError::Parse {
                line: index + 1,
                source,
            })
        })
        .collect()
}

async fn import_into<T>(
    writer: &SqliteWriter,
    table: &T,
    contents: &str,
    options: BulkInsertOptions,
) -> Result<ImportSummary, ImportError>
where
    T: SqliteTable + Sync,
    T::Record: DeserializeOwned + Sync,
    T::Row: Send,
{
    let records: Vec<T::Record> = parse_jsonl(contents)?;
    let report = BulkInserter::new(writer)
        .options(options)
        .insert_with_report(table, &records)
        .await?;

    Ok(ImportSummary {
        table: table.name().to_string(),
        submitted: report.submitted,
        inserted: report.inserted.len(),
        failed_chunks: report.failures,
    })
}

/// Reads `path` and bulk-inserts its records into `table`.
///
/// In stop mode the first chunk failure aborts with
/// [`ImportError::Database`]; earlier chunks stay written.
pub async fn import_jsonl(
    writer: &SqliteWriter,
    table: ImportTable,
    path: &Path,
    options: BulkInsertOptions,
) -> Result<ImportSummary, ImportError> {
    let contents = tokio::fs::read_to_string(path).await?;
    log::info!(
        "Importing {} into {:?} (batch size {}, continue on error: {})",
        path.display(),
        table,
        options.batch_size(),
        options.continue_on_error()
    );

    match table {
        ImportTable::StockUpdates => import_into(writer, &StockUpdatesTable, &contents, options).await,
        ImportTable::OptionFlowTrades => {
            import_into(writer, &OptionFlowTradesTable, &contents, options).await
        }
        ImportTable::DarkPoolPrints => {
            import_into(writer, &DarkPoolPrintsTable, &contents, options).await
        }
        ImportTable::Watchlists => import_into(writer, &WatchlistTable, &contents, options).await,
        ImportTable::Notifications => {
            import_into(writer, &NotificationsTable, &contents, options).await
        }
    }
}
