//! Watchlists and user preferences.

use std::collections::HashSet;

use sqlx::{Row, SqlitePool};

use crate::config::normalize_ticker;
use crate::error_handling::DatabaseError;
use crate::storage::models::UserPreferences;

/// Inserts or replaces a user's alert settings.
pub async fn upsert_preferences(
    pool: &SqlitePool,
    prefs: &UserPreferences,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO user_preferences (user_id, email, alerts_enabled, min_alert_premium, updated_at_ms)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(user_id) DO UPDATE SET
             email=excluded.email,
             alerts_enabled=excluded.alerts_enabled,
             min_alert_premium=excluded.min_alert_premium,
             updated_at_ms=excluded.updated_at_ms",
    )
    .bind(prefs.user_id.trim())
    .bind(prefs.email.trim())
    .bind(prefs.alerts_enabled)
    .bind(prefs.min_alert_premium)
    .bind(chrono::Utc::now().timestamp_millis())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_preferences(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<UserPreferences>, DatabaseError> {
    let row = sqlx::query(
        "SELECT user_id, email, alerts_enabled, min_alert_premium
         FROM user_preferences WHERE user_id = ?",
    )
    .bind(user_id.trim())
    .fetch_optional(pool)
    .await?;

    row.map(|row| preferences_from_row(&row))
        .transpose()
        .map_err(DatabaseError::SqlError)
}

/// Adds `ticker` to a user's watchlist. Returns `false` if it was already there.
pub async fn add_to_watchlist(
    pool: &SqlitePool,
    user_id: &str,
    ticker: &str,
) -> Result<bool, DatabaseError> {
    let result = sqlx::query(
        "INSERT INTO watchlists (user_id, ticker) VALUES (?, ?)
         ON CONFLICT(user_id, ticker) DO NOTHING",
    )
    .bind(user_id.trim())
    .bind(normalize_ticker(ticker))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Removes `ticker` from a user's watchlist. Returns `false` if it wasn't there.
pub async fn remove_from_watchlist(
    pool: &SqlitePool,
    user_id: &str,
    ticker: &str,
) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM watchlists WHERE user_id = ? AND ticker = ?")
        .bind(user_id.trim())
        .bind(normalize_ticker(ticker))
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// A user's watched tickers, alphabetically.
pub async fn list_watchlist(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>, DatabaseError> {
    let tickers = sqlx::query_scalar("SELECT ticker FROM watchlists WHERE user_id = ? ORDER BY ticker")
        .bind(user_id.trim())
        .fetch_all(pool)
        .await?;
    Ok(tickers)
}

/// Every ticker on any watchlist, alphabetically.
pub async fn watched_tickers(pool: &SqlitePool) -> Result<Vec<String>, DatabaseError> {
    let tickers = sqlx::query_scalar("SELECT DISTINCT ticker FROM watchlists ORDER BY ticker")
        .fetch_all(pool)
        .await?;
    Ok(tickers)
}

/// Users with alerts enabled who watch `ticker`.
pub async fn watchers_for_ticker(
    pool: &SqlitePool,
    ticker: &str,
) -> Result<Vec<UserPreferences>, DatabaseError> {
    let rows = sqlx::query(
        "SELECT p.user_id, p.email, p.alerts_enabled, p.min_alert_premium
         FROM watchlists w
         JOIN user_preferences p ON p.user_id = w.user_id
         WHERE w.ticker = ? AND p.alerts_enabled = 1
         ORDER BY p.user_id",
    )
    .bind(normalize_ticker(ticker))
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(preferences_from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::SqlError)
}

/// Users already sent a `kind` alert for `ticker` on `alert_date`.
pub async fn alerted_users(
    pool: &SqlitePool,
    ticker: &str,
    kind: &str,
    alert_date: &str,
) -> Result<HashSet<String>, DatabaseError> {
    let users: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT user_id FROM notifications
         WHERE ticker = ? AND kind = ? AND alert_date = ?",
    )
    .bind(normalize_ticker(ticker))
    .bind(kind)
    .bind(alert_date)
    .fetch_all(pool)
    .await?;
    Ok(users.into_iter().collect())
}

fn preferences_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<UserPreferences, sqlx::Error> {
    Ok(UserPreferences {
        user_id: row.try_get("user_id")?,
        email: row.try_get("email")?,
        alerts_enabled: row.try_get("alerts_enabled")?,
        min_alert_premium: row.try_get("min_alert_premium")?,
    })
}
