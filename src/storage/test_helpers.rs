//! Shared test helpers for storage module tests.

#[cfg(test)]
use sqlx::sqlite::SqlitePoolOptions;
#[cfg(test)]
use sqlx::SqlitePool;

#[cfg(test)]
use crate::storage::run_migrations;

/// Creates a test database pool with migrations applied.
/// Uses a single-connection in-memory database so every query sees the same data.
#[cfg(test)]
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
#[cfg(test)]
pub async fn create_test_user(pool: &SqlitePool, user_id: &str, tickers: &[&str], min_premium: f64) {
    use crate::storage::models::UserPreferences;
    use crate::storage::users::{add_to_watchlist, upsert_preferences};

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
