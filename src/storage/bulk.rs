//! Batched, partial-failure-tolerant bulk insert.
//!
//! Records are split into contiguous chunks of at most `batch_size` and each
//! chunk is written with one insert-returning operation. Chunks are written
//! strictly one after another, in input order.
//!
//! When a chunk fails:
//! - **stop mode** (default): the writer's error is returned unchanged. Chunks
//!   already written stay written; later chunks are never attempted.
//! - **continue mode**: the failure is logged, the chunk's records are dropped
//!   from this call, and the next chunk is attempted.
//!
//! In continue mode `insert` returns fewer rows than submitted without saying
//! which records were lost. Callers that need that detail use
//! `insert_with_report`, which carries one `ChunkFailure` per failed chunk.

use std::fmt::Display;
use std::future::Future;

use crate::config::{DEFAULT_BATCH_SIZE, MAX_ERROR_MESSAGE_LENGTH};

/// A storage table that records can be bulk-inserted into.
///
/// `Record` is what callers submit; `Row` is what the storage layer returns
/// for each persisted record (usually the record plus server-assigned
/// columns such as ids and timestamps).
pub trait Table {
    type Record;
    type Row;

    /// Table identifier used in log lines and by the writer.
    fn name(&self) -> &str;
}

/// The write operation consumed by the bulk insert.
///
/// One call writes one chunk and returns the rows actually persisted. A call
/// either persists the whole chunk or fails.
pub trait BulkWriter<T: Table> {
    type Error: Display;

    fn insert_returning(
        &self,
        table: &T,
        records: &[T::Record],
    ) -> impl Future<Output = Result<Vec<T::Row>, Self::Error>> + Send;

    /// Largest chunk one call can accept for `table`, if storage imposes one.
    /// Larger batch sizes are lowered to this for the call.
    fn max_chunk_len(&self, _table: &T) -> Option<usize> {
        None
    }
}

/// Logging capability injected into the bulk insert.
pub trait BulkLogger {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn debug(&self, message: &str);
}

/// `BulkLogger` that forwards to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl BulkLogger for LogFacade {
    fn info(&self, message: &str) {
        log::info!(target: "fund_pipeline::storage::bulk", "{}", message);
    }

    fn warn(&self, message: &str) {
        log::warn!(target: "fund_pipeline::storage::bulk", "{}", message);
    }

    fn error(&self, message: &str) {
        log::error!(target: "fund_pipeline::storage::bulk", "{}", message);
    }

    fn debug(&self, message: &str) {
        log::debug!(target: "fund_pipeline::storage::bulk", "{}", message);
    }
}

/// Batch size and error mode for one bulk insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkInsertOptions {
    batch_size: usize,
    continue_on_error: bool,
}

impl BulkInsertOptions {
    /// A `batch_size` of zero is treated as one.
    pub fn new(batch_size: usize, continue_on_error: bool) -> Self {
        Self {
            batch_size: batch_size.max(1),
            continue_on_error,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }
}

impl Default for BulkInsertOptions {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, false)
    }
}

/// A chunk whose write failed in continue mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// 1-based position of the chunk.
    pub chunk_index: usize,
    pub chunk_count: usize,
    /// Records lost with this chunk.
    pub record_count: usize,
    /// Storage error rendered as text.
    pub message: String,
}

impl std::fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "chunk {}/{} ({} records) failed: {}",
            self.chunk_index, self.chunk_count, self.record_count, self.message
        )
    }
}

/// Outcome of a bulk insert, including what was dropped in continue mode.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkInsertReport<R> {
    /// Rows returned by storage, in chunk order.
    pub inserted: Vec<R>,
    /// Failed chunks in the order they were attempted.
    pub failures: Vec<ChunkFailure>,
    /// Records handed to the call.
    pub submitted: usize,
}

impl<R> BulkInsertReport<R> {
    fn empty() -> Self {
        Self {
            inserted: Vec::new(),
            failures: Vec::new(),
            submitted: 0,
        }
    }

    /// True when no chunk failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Records that belonged to failed chunks.
    pub fn lost_records(&self) -> usize {
        self.failures.iter().map(|f| f.record_count).sum()
    }
}

/// Bulk insert bound to a writer and a logger.
///
/// ```no_run
/// use fund_pipeline::storage::{BulkInserter, SqliteWriter, WatchlistTable};
/// use fund_pipeline::storage::models::NewWatchlistEntry;
///
/// # async fn example(writer: SqliteWriter) -> Result<(), sqlx::Error> {
/// let entries = vec![NewWatchlistEntry::new("u1", "AAPL")];
/// let rows = BulkInserter::new(&writer)
///     .batch_size(50)
///     .continue_on_error(true)
///     .insert(&WatchlistTable, &entries)
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct BulkInserter<'a, W, L = LogFacade> {
    writer: &'a W,
    logger: L,
    options: BulkInsertOptions,
}

impl<'a, W> BulkInserter<'a, W, LogFacade> {
    pub fn new(writer: &'a W) -> Self {
        Self {
            writer,
            logger: LogFacade,
            options: BulkInsertOptions::default(),
        }
    }
}

impl<'a, W, L: BulkLogger> BulkInserter<'a, W, L> {
    /// Replaces the logger.
    pub fn logger<L2: BulkLogger>(self, logger: L2) -> BulkInserter<'a, W, L2> {
        BulkInserter {
            writer: self.writer,
            logger,
            options: self.options,
        }
    }

    pub fn options(mut self, options: BulkInsertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.options = BulkInsertOptions::new(batch_size, self.options.continue_on_error);
        self
    }

    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.options = BulkInsertOptions::new(self.options.batch_size, continue_on_error);
        self
    }

    /// Inserts `records` and returns the persisted rows in chunk order.
    pub async fn insert<T>(&self, table: &T, records: &[T::Record]) -> Result<Vec<T::Row>, W::Error>
    where
        T: Table,
        W: BulkWriter<T>,
    {
        self.insert_with_report(table, records)
            .await
            .map(|report| report.inserted)
    }

    /// Inserts `records` and reports which chunks were dropped.
    ///
    /// In stop mode the first failure is still returned as `Err`; the report
    /// only ever carries failures in continue mode.
    pub async fn insert_with_report<T>(
        &self,
        table: &T,
        records: &[T::Record],
    ) -> Result<BulkInsertReport<T::Row>, W::Error>
    where
        T: Table,
        W: BulkWriter<T>,
    {
        if records.is_empty() {
            return Ok(BulkInsertReport::empty());
        }

        let mut batch_size = self.options.batch_size;
        if let Some(cap) = self.writer.max_chunk_len(table) {
            let cap = cap.max(1);
            if batch_size > cap {
                self.logger.warn(&format!(
                    "Batch size {} exceeds the {}-record limit for {}; using {}",
                    batch_size,
                    cap,
                    table.name(),
                    cap
                ));
                batch_size = cap;
            }
        }
        let chunk_count = records.len().div_ceil(batch_size);
        let mut report = BulkInsertReport {
            inserted: Vec::with_capacity(records.len()),
            failures: Vec::new(),
            submitted: records.len(),
        };

        self.logger.debug(&format!(
            "Bulk inserting {} records into {} in {} chunk(s) of up to {}",
            records.len(),
            table.name(),
            chunk_count,
            batch_size
        ));

        for (position, chunk) in records.chunks(batch_size).enumerate() {
            let chunk_index = position + 1;
            match self.writer.insert_returning(table, chunk).await {
                Ok(rows) => {
                    self.logger.debug(&format!(
                        "Inserted chunk {}/{} into {} ({} rows)",
                        chunk_index,
                        chunk_count,
                        table.name(),
                        rows.len()
                    ));
                    report.inserted.extend(rows);
                }
                Err(e) => {
                    let failure = ChunkFailure {
                        chunk_index,
                        chunk_count,
                        record_count: chunk.len(),
                        message: truncate_message(&e.to_string()),
                    };
                    self.logger.error(&format!(
                        "Bulk insert into {}: {}",
                        table.name(),
                        failure
                    ));
                    if !self.options.continue_on_error {
                        return Err(e);
                    }
                    report.failures.push(failure);
                }
            }
        }

        if report.is_complete() {
            self.logger.info(&format!(
                "Inserted {} records into {}",
                report.inserted.len(),
                table.name()
            ));
        } else {
            self.logger.warn(&format!(
                "Inserted {} of {} records into {}; {} chunk(s) failed ({} records dropped)",
                report.inserted.len(),
                report.submitted,
                table.name(),
                report.failures.len(),
                report.lost_records()
            ));
        }

        Ok(report)
    }
}

/// Inserts `records` into `table` in chunks of `batch_size`.
///
/// Logs through the `log` facade. See the module docs for the failure modes.
pub async fn bulk_insert<T, W>(
    writer: &W,
    table: &T,
    records: &[T::Record],
    batch_size: usize,
    continue_on_error: bool,
) -> Result<Vec<T::Row>, W::Error>
where
    T: Table,
    W: BulkWriter<T>,
{
    BulkInserter::new(writer)
        .options(BulkInsertOptions::new(batch_size, continue_on_error))
        .insert(table, records)
        .await
}

fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MAX_ERROR_MESSAGE_LENGTH {
        return message.to_string();
    }
    let truncated: String = message.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect();
    format!("{}... (truncated)", truncated)
}
