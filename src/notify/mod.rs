//! Alert outbox and delivery.
//!
//! Alerts are first written to the `notifications` outbox through the bulk
//! insert (continuing past failed chunks), then handed to a [`Notifier`]. A
//! delivery failure is logged and counted and never undoes the outbox row.

mod digest;

use std::collections::HashMap;
use std::future::Future;

use futures::future::join_all;
use log::{info, warn};

use crate::error_handling::{ErrorType, InfoType, NotifyError, ProcessingStats};
use crate::storage::models::{NewNotification, Notification, UserPreferences};
use crate::storage::{BulkInserter, NotificationsTable, SqliteWriter};

pub use digest::{
    dark_pool_alerts, dark_pool_body, dark_pool_subject, option_flow_alerts, option_flow_body,
    option_flow_subject, AlertKind,
};

/// Delivers a stored alert to its recipient.
pub trait Notifier {
    fn deliver(
        &self,
        recipient: &UserPreferences,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Notifier that writes each alert to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn deliver(
        &self,
        recipient: &UserPreferences,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        info!(
            "Alert #{} to {} <{}>: {}",
            notification.id, recipient.user_id, recipient.email, notification.record.subject
        );
        Ok(())
    }
}

/// What happened to a set of alerts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub queued: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Writes `alerts` to the outbox and delivers the stored ones.
///
/// `recipients` supplies the delivery address for each alert's user.
pub async fn dispatch_alerts<N: Notifier>(
    writer: &SqliteWriter,
    notifier: &N,
    recipients: &[UserPreferences],
    alerts: &[NewNotification],
    batch_size: usize,
    stats: &ProcessingStats,
) -> Result<DispatchSummary, sqlx::Error> {
    let mut summary = DispatchSummary::default();
    if alerts.is_empty() {
        return Ok(summary);
    }

    let report = BulkInserter::new(writer)
        .batch_size(batch_size)
        .continue_on_error(true)
        .insert_with_report(&NotificationsTable, alerts)
        .await?;
    stats.add_error(ErrorType::ChunkWriteFailed, report.failures.len());
    summary.queued = report.inserted.len();
    stats.add_info(InfoType::AlertQueued, summary.queued);

    let by_user: HashMap<&str, &UserPreferences> =
        recipients.iter().map(|r| (r.user_id.as_str(), r)).collect();

    let mut deliveries = Vec::with_capacity(report.inserted.len());
    for notification in &report.inserted {
        match by_user.get(notification.record.user_id.as_str()) {
            Some(recipient) => deliveries.push(notifier.deliver(recipient, notification)),
            None => {
                warn!(
                    "No recipient for alert #{} (user {})",
                    notification.id, notification.record.user_id
                );
                summary.failed += 1;
                stats.increment_error(ErrorType::NotificationFailed);
            }
        }
    }

    // Deliveries run concurrently; the outbox rows are already committed.
    for result in join_all(deliveries).await {
        match result {
            Ok(()) => summary.delivered += 1,
            Err(e) => {
                warn!("{}", e);
                summary.failed += 1;
                stats.increment_error(ErrorType::NotificationFailed);
            }
        }
    }

    Ok(summary)
}
