//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for initialization, storage, sources and imports
//! - Processing statistics tracking (errors and info metrics)
//!
//! Counted errors affect a single ticker or chunk. Errors that abort an
//! operation are returned as `Result`s instead.

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    DatabaseError, ErrorType, ImportError, InfoType, InitializationError, JobError, NotifyError,
    SourceError,
};
