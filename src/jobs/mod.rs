//! Scheduled polling jobs.
//!
//! Three jobs pull data for every tracked ticker, store raw rows through the
//! bulk insert, upsert daily analyses, and queue alerts for watchers. The
//! scheduler runs due jobs one after another on a single task.

mod context;
mod scheduler;
mod tasks;

use std::time::Duration;

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::config::{DARK_POOL_INTERVAL, MARKET_DATA_INTERVAL, OPTION_FLOW_INTERVAL};

pub use context::JobContext;
pub use scheduler::{due_jobs, run_once, run_scheduler};
pub use tasks::run_job;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    MarketData,
    OptionFlow,
    DarkPool,
}

impl JobKind {
    /// Minimum time between two runs of this job.
    pub fn interval(&self) -> Duration {
        match self {
            JobKind::MarketData => MARKET_DATA_INTERVAL,
            JobKind::OptionFlow => OPTION_FLOW_INTERVAL,
            JobKind::DarkPool => DARK_POOL_INTERVAL,
        }
    }
}

/// Outcome of one job execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReport {
    pub job: JobKind,
    /// `None` when the job was skipped.
    pub run_id: Option<String>,
    /// The market was closed and the job did nothing.
    pub skipped: bool,
    pub tickers_total: usize,
    pub tickers_succeeded: usize,
    pub rows_written: usize,
    pub alerts_queued: usize,
    pub elapsed_seconds: f64,
}

impl JobReport {
    pub(crate) fn skipped(job: JobKind) -> Self {
        Self {
            job,
            run_id: None,
            skipped: true,
            tickers_total: 0,
            tickers_succeeded: 0,
            rows_written: 0,
            alerts_queued: 0,
            elapsed_seconds: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_job_names_and_intervals() {
        let names: Vec<String> = JobKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["market_data", "option_flow", "dark_pool"]);
        assert_eq!(JobKind::MarketData.interval(), Duration::from_secs(900));
        assert_eq!(JobKind::DarkPool.interval(), Duration::from_secs(7200));
    }
}
