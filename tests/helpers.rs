// Shared test helpers for database setup and test data creation.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use fund_pipeline::run_migrations;
use fund_pipeline::storage::models::UserPreferences;
use fund_pipeline::storage::users::{add_to_watchlist, upsert_preferences};

/// Creates a test database pool with migrations applied.
/// A single connection keeps every query on the same in-memory database.
#[allow(dead_code)] // Used by other test files
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Creates a user with alerts enabled and the given watchlist.
#[allow(dead_code)] // Used by other test files
pub async fn create_test_user(pool: &SqlitePool, user_id: &str, tickers: &[&str], min_premium: f64) {
    upsert_preferences(
        pool,
        &UserPreferences {
            user_id: user_id.to_string(),
            email: format!("{user_id}@example.com"),
            alerts_enabled: true,
            min_alert_premium: min_premium,
        },
    )
    .await
    .expect("Failed to insert test preferences");

    for ticker in tickers {
        add_to_watchlist(pool, user_id, ticker)
            .await
            .expect("Failed to insert test watchlist entry");
    }
}

/// Row count of `table`.
#[allow(dead_code)] // Used by other test files
pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}
