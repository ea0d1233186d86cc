//! Application initialization.
//!
//! Logger setup lives here; the database pool is initialized by
//! `storage::init_db_pool_with_path`.

mod logger;

// Re-export public API
pub use logger::init_logger_with;
