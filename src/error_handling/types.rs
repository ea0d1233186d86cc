//! Error type definitions.
//!
//! This module defines the error and metric types used throughout the pipeline.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

/// Error types returned by market data sources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The provider did not answer for this ticker.
    #[error("source unavailable for {ticker}: {reason}")]
    Unavailable { ticker: String, reason: String },

    /// The provider answered but had nothing for this ticker.
    #[error("no data for {ticker}")]
    NoData { ticker: String },
}

/// Error types for JSONL imports.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The input file could not be read.
    #[error("failed to read import file: {0}")]
    Io(#[from] std::io::Error),

    /// A line did not deserialize into the target record type.
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A chunk write failed while stopping on the first error.
    #[error("bulk insert aborted: {0}")]
    Database(#[from] sqlx::Error),
}

/// Error types for alert delivery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The notifier could not hand the alert to its recipient.
    #[error("failed to deliver alert to {recipient}: {reason}")]
    Delivery { recipient: String, reason: String },
}

/// Error types for one ticker inside a job.
///
/// A ticker error is logged and counted; the job moves on to the next ticker.
#[derive(Error, Debug)]
pub enum JobError {
    /// The data source failed for this ticker.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A bulk write of raw rows failed while stopping on the first error.
    #[error("bulk insert into {table} failed: {source}")]
    Write {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    /// The daily analysis row could not be stored.
    #[error("storing analysis failed: {0}")]
    Analysis(#[source] DatabaseError),

    /// Watchers for the ticker could not be loaded.
    #[error("loading watchers failed: {0}")]
    Watchers(#[source] DatabaseError),
}

impl JobError {
    /// Counter this error is recorded under.
    pub fn error_type(&self) -> ErrorType {
        match self {
            JobError::Source(e) => ErrorType::from(e),
            JobError::Write { .. } => ErrorType::ChunkWriteFailed,
            JobError::Analysis(_) => ErrorType::AnalysisStoreFailed,
            JobError::Watchers(_) => ErrorType::NotificationFailed,
        }
    }
}

/// Types of errors counted while a job runs.
///
/// A counted error affects one ticker (or one chunk) and never aborts the
/// whole job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    SourceUnavailable,
    SourceNoData,
    ChunkWriteFailed,
    AnalysisStoreFailed,
    NotificationFailed,
}

/// Types of informational metrics counted while a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    /// A job was due but the market was closed.
    MarketClosedSkip,
    /// An analysis flagged unusual activity.
    UnusualActivity,
    /// A notification was queued for a user.
    AlertQueued,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::SourceUnavailable => "Source unavailable",
            ErrorType::SourceNoData => "Source returned no data",
            ErrorType::ChunkWriteFailed => "Chunk write failed",
            ErrorType::AnalysisStoreFailed => "Analysis store failed",
            ErrorType::NotificationFailed => "Notification failed",
        }
    }
}

impl std::fmt::Display for InfoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InfoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::MarketClosedSkip => "Skipped (market closed)",
            InfoType::UnusualActivity => "Unusual activity",
            InfoType::AlertQueued => "Alert queued",
        }
    }
}

impl From<&SourceError> for ErrorType {
    fn from(err: &SourceError) -> Self {
        match err {
            SourceError::Unavailable { .. } => ErrorType::SourceUnavailable,
            SourceError::NoData { .. } => ErrorType::SourceNoData,
        }
    }
}
