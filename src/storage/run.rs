//! Job run bookkeeping.
//!
//! Every scheduled job execution gets a `job_runs` row at start, completed
//! with its counters when the job finishes.

use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;

/// Recorded when a job starts.
pub struct JobRunStart<'a> {
    pub run_id: &'a str,
    pub job_name: &'a str,
    pub version: &'a str,
    pub start_time_ms: i64,
}

/// Recorded when a job finishes.
pub struct JobRunStats<'a> {
    pub run_id: &'a str,
    pub tickers_total: i64,
    pub tickers_succeeded: i64,
    pub rows_written: i64,
    pub elapsed_seconds: f64,
}

pub async fn insert_job_run(pool: &SqlitePool, start: &JobRunStart<'_>) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO job_runs (run_id, job_name, version, start_time_ms)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(run_id) DO UPDATE SET
             job_name=excluded.job_name,
             version=excluded.version,
             start_time_ms=excluded.start_time_ms",
    )
    .bind(start.run_id)
    .bind(start.job_name)
    .bind(start.version)
    .bind(start.start_time_ms)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Completes a run with its counters and an end timestamp.
pub async fn update_job_run_stats(pool: &SqlitePool, stats: &JobRunStats<'_>) -> Result<(), DatabaseError> {
    let end_time_ms = chrono::Utc::now().timestamp_millis();

    sqlx::query(
        "UPDATE job_runs
         SET end_time_ms = ?, tickers_total = ?, tickers_succeeded = ?, rows_written = ?, elapsed_seconds = ?
         WHERE run_id = ?",
    )
    .bind(end_time_ms)
    .bind(stats.tickers_total)
    .bind(stats.tickers_succeeded)
    .bind(stats.rows_written)
    .bind(stats.elapsed_seconds)
    .bind(stats.run_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Completed job runs, most recent first.
///
/// # Example
///
/// ```no_run
/// use fund_pipeline::storage::run::query_job_history;
/// use sqlx::SqlitePool;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = SqlitePool::connect("sqlite:./fund_pipeline.db").await?;
/// for run in query_job_history(&pool, Some(10)).await? {
///     println!("{} {}: {} rows", run.job_name, run.run_id, run.rows_written);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn query_job_history(
    pool: &SqlitePool,
    limit: Option<usize>,
) -> Result<Vec<JobRunSummary>, DatabaseError> {
    let rows = sqlx::query(
        "SELECT run_id, job_name, version, start_time_ms, end_time_ms,
                tickers_total, tickers_succeeded, rows_written, elapsed_seconds
         FROM job_runs
         WHERE end_time_ms IS NOT NULL
         ORDER BY start_time_ms DESC, run_id DESC
         LIMIT ?",
    )
    .bind(limit.map(|l| l as i64).unwrap_or(-1))
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    let summaries = rows
        .into_iter()
        .map(|row| JobRunSummary {
            run_id: row.get("run_id"),
            job_name: row.get("job_name"),
            version: row.get("version"),
            start_time_ms: row.get("start_time_ms"),
            end_time_ms: row.get("end_time_ms"),
            tickers_total: row.get("tickers_total"),
            tickers_succeeded: row.get("tickers_succeeded"),
            rows_written: row.get("rows_written"),
            elapsed_seconds: row.get("elapsed_seconds"),
        })
        .collect();

    Ok(summaries)
}

/// A completed job run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct JobRunSummary {
    pub run_id: String,
    pub job_name: String,
    pub version: String,
    pub start_time_ms: i64,
    pub end_time_ms: Option<i64>,
    pub tickers_total: i64,
    pub tickers_succeeded: i64,
    pub rows_written: i64,
    pub elapsed_seconds: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::create_test_pool;

    async fn finished_run(pool: &SqlitePool, run_id: &str, start: i64, rows: i64) {
        insert_job_run(
            pool,
            &JobRunStart {
                run_id,
                job_name: "market_data",
                version: "test",
                start_time_ms: start,
            },
        )
        .await
        .unwrap();
        update_job_run_stats(
            pool,
            &JobRunStats {
                run_id,
                tickers_total: 3,
                tickers_succeeded: 2,
                rows_written: rows,
                elapsed_seconds: 1.5,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_history_excludes_unfinished_runs() {
        let pool = create_test_pool().await;
        finished_run(&pool, "done", 1_000, 3).await;
        insert_job_run(
            &pool,
            &JobRunStart {
                run_id: "running",
                job_name: "dark_pool",
                version: "test",
                start_time_ms: 2_000,
            },
        )
        .await
        .unwrap();

        let history = query_job_history(&pool, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].run_id, "done");
        assert_eq!(history[0].tickers_succeeded, 2);
        assert_eq!(history[0].rows_written, 3);
        assert_eq!(history[0].elapsed_seconds, Some(1.5));
        assert!(history[0].end_time_ms.is_some());
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_limited() {
        let pool = create_test_pool().await;
        finished_run(&pool, "a", 1_000, 1).await;
        finished_run(&pool, "b", 3_000, 2).await;
        finished_run(&pool, "c", 2_000, 3).await;

        let history = query_job_history(&pool, Some(2)).await.unwrap();
        let ids: Vec<&str> = history.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
