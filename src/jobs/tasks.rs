//! Job bodies.
//!
//! A job walks the ticker universe serially. One ticker failing is logged and
//! counted and the job moves on; only bookkeeping failures abort a job.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::error_handling::{ErrorType, InfoType, JobError, SourceError};
use crate::jobs::{JobContext, JobKind, JobReport};
use crate::market::{
    analyze_dark_pool, analyze_option_flow, is_market_open, quote_snapshot,
};
use crate::notify::{dark_pool_alerts, dispatch_alerts, option_flow_alerts, Notifier};
use crate::sources::MarketDataSource;
use crate::storage::models::{NewNotification, NewStockUpdate, UserPreferences};
use crate::storage::run::{insert_job_run, update_job_run_stats, JobRunStart, JobRunStats};
use crate::storage::tables::SqliteTable;
use crate::storage::upsert::{upsert_dark_pool_analysis, upsert_option_flow_analysis};
use crate::storage::users::{alerted_users, watchers_for_ticker};
use crate::storage::{BulkInserter, DarkPoolPrintsTable, OptionFlowTradesTable, StockUpdatesTable};

#[derive(Debug, Default, Clone, Copy)]
struct TickerOutcome {
    rows: usize,
    alerts: usize,
}

/// Runs one job over the whole ticker universe as of `now`.
///
/// Returns a skipped report without touching storage when the market gate
/// is on and the market is closed at `now`.
pub async fn run_job<S, N>(ctx: &JobContext<S, N>, kind: JobKind, now: DateTime<Utc>) -> Result<JobReport>
where
    S: MarketDataSource + Sync,
    N: Notifier + Sync,
{
    if ctx.config.respect_market_hours && !is_market_open(now) {
        info!("Market closed, skipping {} job", kind);
        ctx.stats.increment_info(InfoType::MarketClosedSkip);
        return Ok(JobReport::skipped(kind));
    }

    let tickers = ctx
        .ticker_universe()
        .await
        .context("Failed to resolve ticker universe")?;

    let start_time = Instant::now();
    let start_time_ms = Utc::now().timestamp_millis();
    let run_id = format!("{}_{}", kind, start_time_ms);
    insert_job_run(
        &ctx.pool,
        &JobRunStart {
            run_id: &run_id,
            job_name: kind.as_ref(),
            version: env!("CARGO_PKG_VERSION"),
            start_time_ms,
        },
    )
    .await
    .context("Failed to insert job run")?;
    info!("Starting {} job ({} tickers, run {})", kind, tickers.len(), run_id);

    let mut succeeded = 0;
    let mut rows_written = 0;
    let mut alerts_queued = 0;
    let mut quotes: Vec<NewStockUpdate> = Vec::new();
    let cancel = ctx.cancellation_token();

    for (position, ticker) in tickers.iter().enumerate() {
        if position > 0 && !ctx.config.ticker_pause().is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(ctx.config.ticker_pause()) => {}
                _ = cancel.cancelled() => {}
            }
        }
        if cancel.is_cancelled() {
            warn!("{} job cancelled after {} of {} tickers", kind, position, tickers.len());
            break;
        }

        let result = match kind {
            JobKind::MarketData => fetch_quote(ctx, ticker, now).await.map(|quote| {
                quotes.push(quote);
                TickerOutcome::default()
            }),
            JobKind::OptionFlow => process_option_flow(ctx, ticker, now).await,
            JobKind::DarkPool => process_dark_pool(ctx, ticker, now).await,
        };

        match result {
            Ok(outcome) => {
                succeeded += 1;
                rows_written += outcome.rows;
                alerts_queued += outcome.alerts;
            }
            Err(e) => {
                warn!("{} job, {}: {}", kind, ticker, e);
                ctx.stats.increment_error(e.error_type());
            }
        }
    }

    // Quotes go out in one bulk insert per run.
    if !quotes.is_empty() {
        match write_rows(ctx, &StockUpdatesTable, &quotes).await {
            Ok(rows) => rows_written += rows,
            Err(e) => {
                warn!("{} job: {}", kind, e);
                ctx.stats.increment_error(e.error_type());
            }
        }
    }

    let elapsed_seconds = start_time.elapsed().as_secs_f64();
    update_job_run_stats(
        &ctx.pool,
        &JobRunStats {
            run_id: &run_id,
            tickers_total: tickers.len() as i64,
            tickers_succeeded: succeeded as i64,
            rows_written: rows_written as i64,
            elapsed_seconds,
        },
    )
    .await
    .context("Failed to update job run statistics")?;

    info!(
        "Finished {} job: {}/{} tickers, {} rows, {} alerts in {:.1}s",
        kind,
        succeeded,
        tickers.len(),
        rows_written,
        alerts_queued,
        elapsed_seconds
    );

    Ok(JobReport {
        job: kind,
        run_id: Some(run_id),
        skipped: false,
        tickers_total: tickers.len(),
        tickers_succeeded: succeeded,
        rows_written,
        alerts_queued,
        elapsed_seconds,
    })
}

/// Bulk-inserts raw rows with the configured batch size and error mode.
/// Returns the number of rows stored.
async fn write_rows<S, N, T>(ctx: &JobContext<S, N>, table: &T, records: &[T::Record]) -> Result<usize, JobError>
where
    T: SqliteTable + Sync,
    T::Record: Sync,
    T::Row: Send,
{
    let report = BulkInserter::new(&ctx.writer)
        .batch_size(ctx.config.batch_size)
        .continue_on_error(ctx.config.continue_on_error)
        .insert_with_report(table, records)
        .await
        .map_err(|source| JobError::Write {
            table: table.name().to_string(),
            source,
        })?;

    ctx.stats
        .add_error(ErrorType::ChunkWriteFailed, report.failures.len());
    Ok(report.inserted.len())
}

async fn fetch_quote<S, N>(ctx: &JobContext<S, N>, ticker: &str, now: DateTime<Utc>) -> Result<NewStockUpdate, JobError>
where
    S: MarketDataSource,
{
    let bars = ctx.source.fetch_intraday(ticker, now).await?;
    let quote = quote_snapshot(ticker, &bars).ok_or_else(|| SourceError::NoData {
        ticker: ticker.to_string(),
    })?;
    debug!("{} at {:.2} ({:+.2}%)", ticker, quote.price, quote.change_percent);
    Ok(quote)
}

async fn process_option_flow<S, N>(
    ctx: &JobContext<S, N>,
    ticker: &str,
    now: DateTime<Utc>,
) -> Result<TickerOutcome, JobError>
where
    S: MarketDataSource,
    N: Notifier,
{
    let snapshot = ctx.source.fetch_option_flow(ticker, now).await?;
    let Some(analysis) = analyze_option_flow(&snapshot, now.timestamp_millis()) else {
        debug!("No option flow for {}", ticker);
        return Ok(TickerOutcome::default());
    };

    let rows = write_rows(ctx, &OptionFlowTradesTable, &snapshot.trades).await?;
    upsert_option_flow_analysis(&ctx.pool, &analysis)
        .await
        .map_err(JobError::Analysis)?;

    let mut outcome = TickerOutcome { rows, alerts: 0 };
    if analysis.has_unusual_activity {
        ctx.stats.increment_info(InfoType::UnusualActivity);
        info!(
            "Unusual options activity in {}: {} call, {} put prints ({})",
            ticker, analysis.unusual_call_count, analysis.unusual_put_count, analysis.sentiment
        );
        let watchers = watchers_for_ticker(&ctx.pool, ticker)
            .await
            .map_err(JobError::Watchers)?;
        let alerts = option_flow_alerts(&analysis, &watchers);
        outcome.alerts = queue_alerts(ctx, &watchers, &alerts).await?;
    }
    Ok(outcome)
}

async fn process_dark_pool<S, N>(
    ctx: &JobContext<S, N>,
    ticker: &str,
    now: DateTime<Utc>,
) -> Result<TickerOutcome, JobError>
where
    S: MarketDataSource,
    N: Notifier,
{
    let snapshot = ctx.source.fetch_dark_pool(ticker, now).await?;
    let analysis = analyze_dark_pool(&snapshot, now.timestamp_millis());

    let rows = write_rows(ctx, &DarkPoolPrintsTable, &snapshot.prints()).await?;
    upsert_dark_pool_analysis(&ctx.pool, &analysis)
        .await
        .map_err(JobError::Analysis)?;

    let mut outcome = TickerOutcome { rows, alerts: 0 };
    if analysis.is_unusual() {
        ctx.stats.increment_info(InfoType::UnusualActivity);
        info!(
            "Heavy dark pool activity in {}: {:.1}% of volume, largest block {}",
            ticker, analysis.dark_pool_percentage, analysis.largest_block
        );
        let watchers = watchers_for_ticker(&ctx.pool, ticker)
            .await
            .map_err(JobError::Watchers)?;
        let alerts = dark_pool_alerts(&analysis, &watchers);
        outcome.alerts = queue_alerts(ctx, &watchers, &alerts).await?;
    }
    Ok(outcome)
}

/// Queues `alerts`, skipping users already alerted for the same ticker,
/// kind and trading date.
async fn queue_alerts<S, N>(
    ctx: &JobContext<S, N>,
    watchers: &[UserPreferences],
    alerts: &[NewNotification],
) -> Result<usize, JobError>
where
    N: Notifier,
{
    let mut already_sent: HashMap<(&str, &str, &str), HashSet<String>> = HashMap::new();
    let mut fresh = Vec::with_capacity(alerts.len());
    for alert in alerts {
        let key = (alert.ticker.as_str(), alert.kind.as_str(), alert.alert_date.as_str());
        if !already_sent.contains_key(&key) {
            let users = alerted_users(&ctx.pool, key.0, key.1, key.2)
                .await
                .map_err(JobError::Watchers)?;
            already_sent.insert(key, users);
        }
        if already_sent.get(&key).is_some_and(|users| users.contains(&alert.user_id)) {
            debug!(
                "{} already alerted about {} ({}) on {}",
                alert.user_id, alert.ticker, alert.kind, alert.alert_date
            );
            continue;
        }
        fresh.push(alert.clone());
    }

    let summary = dispatch_alerts(
        &ctx.writer,
        &ctx.notifier,
        watchers,
        &fresh,
        ctx.config.batch_size,
        &ctx.stats,
    )
    .await
    .map_err(|source| JobError::Write {
        table: "notifications".to_string(),
        source,
    })?;
    Ok(summary.queued)
}
