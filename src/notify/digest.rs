//! Alert selection and formatting.

use strum_macros::{AsRefStr, Display, EnumString};

use crate::market::{DarkPoolAnalysis, OptionFlowAnalysis};
use crate::storage::models::{NewNotification, UserPreferences};

/// Stored in `notifications.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AlertKind {
    UnusualOptions,
    DarkPool,
}

fn money(value: f64) -> String {
    format!("${:.2}", value)
}

pub fn option_flow_subject(analysis: &OptionFlowAnalysis) -> String {
    format!(
        "Unusual options activity in {} ({})",
        analysis.ticker, analysis.sentiment
    )
}

pub fn option_flow_body(analysis: &OptionFlowAnalysis) -> String {
    let ratio = analysis
        .call_put_ratio
        .map(|r| format!("{:.2}", r))
        .unwrap_or_else(|| "n/a".to_string());

    [
        format!("Date: {}", analysis.date.format("%Y-%m-%d")),
        format!("Sentiment: {}", analysis.sentiment),
        format!("Call premium: {}", money(analysis.total_call_premium)),
        format!("Put premium: {}", money(analysis.total_put_premium)),
        format!("Call/put ratio: {}", ratio),
        format!(
            "Sweeps: {} call, {} put",
            analysis.call_sweeps, analysis.put_sweeps
        ),
        format!(
            "Unusual prints: {} call, {} put",
            analysis.unusual_call_count, analysis.unusual_put_count
        ),
        format!("Largest unusual premium: {}", money(analysis.max_unusual_premium)),
    ]
    .join("\n")
}

pub fn dark_pool_subject(analysis: &DarkPoolAnalysis) -> String {
    format!(
        "Heavy dark pool volume in {} ({:.1}% off-exchange)",
        analysis.ticker, analysis.dark_pool_percentage
    )
}

pub fn dark_pool_body(analysis: &DarkPoolAnalysis) -> String {
    [
        format!("Date: {}", analysis.date.format("%Y-%m-%d")),
        format!(
            "Dark pool volume: {} of {} ({:.1}%)",
            analysis.dark_pool_volume, analysis.total_volume, analysis.dark_pool_percentage
        ),
        format!("Large blocks: {}", analysis.large_block_count),
        format!("Largest block: {}", analysis.largest_block),
    ]
    .join("\n")
}

/// One alert per watcher whose premium floor the flagged activity reaches.
///
/// Nothing is produced unless the analysis has unusual activity.
pub fn option_flow_alerts(
    analysis: &OptionFlowAnalysis,
    watchers: &[UserPreferences],
) -> Vec<NewNotification> {
    if !analysis.has_unusual_activity {
        return Vec::new();
    }

    let subject = option_flow_subject(analysis);
    let body = option_flow_body(analysis);
    let alert_date = analysis.date.format("%Y-%m-%d").to_string();
    watchers
        .iter()
        .filter(|w| w.alerts_enabled && analysis.max_unusual_premium >= w.min_alert_premium)
        .map(|w| NewNotification {
            user_id: w.user_id.clone(),
            ticker: analysis.ticker.clone(),
            kind: AlertKind::UnusualOptions.to_string(),
            subject: subject.clone(),
            body: body.clone(),
            alert_date: alert_date.clone(),
        })
        .collect()
}

/// One alert per watcher with alerts enabled, when the day is unusual.
pub fn dark_pool_alerts(
    analysis: &DarkPoolAnalysis,
    watchers: &[UserPreferences],
) -> Vec<NewNotification> {
    if !analysis.is_unusual() {
        return Vec::new();
    }

    let subject = dark_pool_subject(analysis);
    let body = dark_pool_body(analysis);
    let alert_date = analysis.date.format("%Y-%m-%d").to_string();
    watchers
        .iter()
        .filter(|w| w.alerts_enabled)
        .map(|w| NewNotification {
            user_id: w.user_id.clone(),
            ticker: analysis.ticker.clone(),
            kind: AlertKind::DarkPool.to_string(),
            subject: subject.clone(),
            body: body.clone(),
            alert_date: alert_date.clone(),
        })
        .collect()
}
