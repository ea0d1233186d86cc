//! Job scheduling.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{error, info};
use strum::IntoEnumIterator;
use tokio::time::MissedTickBehavior;

use crate::config::SCHEDULER_TICK;
use crate::jobs::{run_job, JobContext, JobKind, JobReport};
use crate::notify::Notifier;
use crate::sources::MarketDataSource;

/// Jobs due at `now` given when each last ran. Jobs that never ran are due.
pub fn due_jobs(now: DateTime<Utc>, last_runs: &HashMap<JobKind, DateTime<Utc>>) -> Vec<JobKind> {
    JobKind::iter()
        .filter(|kind| match last_runs.get(kind) {
            None => true,
            Some(last) => (now - *last)
                .to_std()
                .map(|elapsed| elapsed >= kind.interval())
                .unwrap_or(false),
        })
        .collect()
}

/// Runs every job once, in order, regardless of intervals.
///
/// The market gate still applies unless disabled in the config.
pub async fn run_once<S, N>(ctx: &JobContext<S, N>, now: DateTime<Utc>) -> Result<Vec<JobReport>>
where
    S: MarketDataSource + Sync,
    N: Notifier + Sync,
{
    let mut reports = Vec::new();
    for kind in JobKind::iter() {
        if ctx.cancellation_token().is_cancelled() {
            break;
        }
        reports.push(run_job(ctx, kind, now).await?);
    }
    ctx.stats().log_summary();
    Ok(reports)
}

/// Wakes up every scheduler tick and runs due jobs until cancelled.
///
/// A job that fails is logged and retried after its interval. A job skipped
/// because the market was closed is retried on the next tick.
pub async fn run_scheduler<S, N>(ctx: &JobContext<S, N>) -> Result<()>
where
    S: MarketDataSource + Sync,
    N: Notifier + Sync,
{
    let cancel = ctx.cancellation_token();
    let mut last_runs: HashMap<JobKind, DateTime<Utc>> = HashMap::new();
    let mut interval = tokio::time::interval(SCHEDULER_TICK);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Scheduler started (tick every {}s)", SCHEDULER_TICK.as_secs());
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let now = Utc::now();
        for kind in due_jobs(now, &last_runs) {
            if cancel.is_cancelled() {
                break;
            }
            match run_job(ctx, kind, now).await {
                Ok(report) if report.skipped => {}
                Ok(_) => {
                    last_runs.insert(kind, now);
                }
                Err(e) => {
                    error!("{} job failed: {:#}", kind, e);
                    last_runs.insert(kind, now);
                }
            }
        }
    }

    info!("Scheduler stopped");
    ctx.stats().log_summary();
    Ok(())
}
