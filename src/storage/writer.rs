//! SQLite implementation of the bulk insert write operation.

use sqlx::{Row, SqlitePool};

use crate::storage::bulk::BulkWriter;
use crate::storage::query::build_batch_insert_query;
use crate::storage::tables::SqliteTable;

/// Writes one chunk as a single `INSERT ... RETURNING *` statement.
///
/// A single statement is atomic in SQLite, so a constraint violation by any
/// record rolls back the whole chunk. A statement binds at most
/// `SQLITE_MAX_VARIABLES` values, so chunks are capped at
/// [`SqliteTable::max_rows_per_statement`] records.
#[derive(Debug, Clone)]
pub struct SqliteWriter {
    pool: SqlitePool,
}

impl SqliteWriter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl<T> BulkWriter<T> for SqliteWriter
where
    T: SqliteTable + Sync,
    T::Record: Sync,
    T::Row: Send,
{
    type Error = sqlx::Error;

    async fn insert_returning(
        &self,
        table: &T,
        records: &[T::Record],
    ) -> Result<Vec<T::Row>, sqlx::Error> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let sql = build_batch_insert_query(
            table.name(),
            table.columns(),
            records.len(),
            Some("RETURNING *"),
        );

        let mut query = sqlx::query(&sql);
        for record in records {
            query = table.bind(query, record);
        }

        let mut rows = query.fetch_all(&self.pool).await?;
        // RETURNING order is unspecified; ids follow VALUES order.
        rows.sort_by_key(|row| row.try_get::<i64, _>("id").unwrap_or(i64::MAX));

        rows.iter().map(|row| table.decode(row)).collect()
    }

    fn max_chunk_len(&self, table: &T) -> Option<usize> {
        Some(table.max_rows_per_statement())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::bulk::{bulk_insert, BulkInserter};
    use crate::storage::models::NewWatchlistEntry;
    use crate::storage::tables::{StockUpdatesTable, WatchlistTable};
    use crate::storage::test_helpers::create_test_pool;

    fn entries(user: &str, tickers: &[&str]) -> Vec<NewWatchlistEntry> {
        tickers
            .iter()
            .map(|t| NewWatchlistEntry::new(user, t))
            .collect()
    }

    async fn count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM watchlists")
            .fetch_one(pool)
            .await
            .expect("count watchlists")
    }

    #[tokio::test]
    async fn test_insert_returning_echoes_server_defaults() {
        let pool = create_test_pool().await;
        let writer = SqliteWriter::new(pool.clone());

        let rows = writer
            .insert_returning(&WatchlistTable, &entries("u1", &["AAPL", "MSFT"]))
            .await
            .expect("insert");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record.ticker, "AAPL");
        assert_eq!(rows[1].record.ticker, "MSFT");
        assert!(rows[0].id < rows[1].id);
        assert!(rows[0].created_at_ms > 0);
    }

    #[tokio::test]
    async fn test_duplicate_fails_whole_chunk_only() {
        let pool = create_test_pool().await;
        let writer = SqliteWriter::new(pool.clone());

        // Chunks of 2: [AAPL, MSFT] [NVDA, AAPL(dup)] [TSLA]
        let input = entries("u1", &["AAPL", "MSFT", "NVDA", "AAPL", "TSLA"]);
        let report = BulkInserter::new(&writer)
            .batch_size(2)
            .continue_on_error(true)
            .insert_with_report(&WatchlistTable, &input)
            .await
            .expect("continue mode never fails");

        let tickers: Vec<&str> = report
            .inserted
            .iter()
            .map(|r| r.record.ticker.as_str())
            .collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT", "TSLA"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].chunk_index, 2);
        assert!(report.failures[0].message.contains("UNIQUE"));
        // NVDA shared the failing statement and was rolled back with it.
        assert_eq!(count(&pool).await, 3);
    }

    #[test]
    fn test_rows_per_statement_follow_column_count() {
        assert_eq!(WatchlistTable.max_rows_per_statement(), 16_383);
        assert_eq!(StockUpdatesTable.max_rows_per_statement(), 3_640);
    }

    #[tokio::test]
    async fn test_oversized_batch_is_split_to_fit_parameter_limit() {
        let pool = create_test_pool().await;
        let writer = SqliteWriter::new(pool.clone());

        let tickers: Vec<String> = (0..40_000).map(|i| format!("T{i}")).collect();
        let input: Vec<NewWatchlistEntry> = tickers
            .iter()
            .map(|t| NewWatchlistEntry::new("u1", t))
            .collect();
        let report = BulkInserter::new(&writer)
            .batch_size(20_000)
            .continue_on_error(true)
            .insert_with_report(&WatchlistTable, &input)
            .await
            .expect("continue mode never fails");

        assert!(report.is_complete(), "failures: {:?}", report.failures);
        assert_eq!(report.inserted.len(), 40_000);
        assert_eq!(report.inserted[39_999].record.ticker, "T39999");
        assert_eq!(count(&pool).await, 40_000);
    }

    #[tokio::test]
    async fn test_stop_mode_keeps_prior_chunks() {
        let pool = create_test_pool().await;
        let writer = SqliteWriter::new(pool.clone());

        let input = entries("u1", &["AAPL", "MSFT", "AAPL", "NVDA", "TSLA"]);
        let result = bulk_insert(&writer, &WatchlistTable, &input, 2, false).await;

        assert!(matches!(result, Err(sqlx::Error::Database(_))));
        // Chunk 1 stays written, chunk 2 failed, chunk 3 never ran.
        assert_eq!(count(&pool).await, 2);
    }
}
