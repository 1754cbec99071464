//! Multi-channel fan-out of a rotation outcome.
//!
//! [`RotationNotifier::notify`] appends to the durable [`RotationLog`] first,
//! then dispatches the email, the persisted system notification, and the
//! Slack and Discord webhooks concurrently. Each channel has its own failure
//! boundary, so one bad channel never blocks the others.
//!
//! Failure policy:
//!
//! - Webhook failures are logged and never propagated.
//! - When the outcome is a success, every delivery failure is logged and
//!   swallowed so a flaky channel cannot mask a completed rotation.
//! - When the outcome is a failure, log, email, or record failures are
//!   returned as [`NotificationError::Delivery`] after being logged.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use urlist_core::RotationOutcome;
use urlist_db::models::notification::SystemNotification;
use urlist_db::NotificationStore;

use crate::delivery::email::Mailer;
use crate::delivery::webhook::{self, ChatWebhookConfig, WebhookDelivery};
use crate::rotation_log::RotationLog;
use crate::templates;

// ---------------------------------------------------------------------------
// Channels and failures
// ---------------------------------------------------------------------------

/// A single delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Log,
    Email,
    Record,
    Slack,
    Discord,
}

impl Channel {
    /// Best-effort channels never propagate failures.
    pub fn is_best_effort(self) -> bool {
        matches!(self, Self::Slack | Self::Discord)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Log => "log",
            Self::Email => "email",
            Self::Record => "record",
            Self::Slack => "slack",
            Self::Discord => "discord",
        };
        f.write_str(name)
    }
}

/// One channel's delivery failure.
#[derive(Debug, Clone)]
pub struct ChannelFailure {
    pub channel: Channel,
    pub error: String,
}

impl ChannelFailure {
    fn new(channel: Channel, error: impl fmt::Display) -> Self {
        Self {
            channel,
            error: error.to_string(),
        }
    }
}

fn describe(failures: &[ChannelFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.channel, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error raised when reporting a failed rotation could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification delivery failed ({})", describe(.0))]
    Delivery(Vec<ChannelFailure>),
}

/// What happened on each channel during one fan-out.
#[derive(Debug, Default)]
pub struct FanoutReport {
    /// Channels that completed successfully.
    pub delivered: Vec<Channel>,
    /// Channels that failed, including best-effort ones.
    pub failures: Vec<ChannelFailure>,
    /// The persisted notification, when the record channel succeeded.
    pub notification: Option<SystemNotification>,
}

impl FanoutReport {
    fn record(&mut self, channel: Channel, result: Result<(), String>) {
        match result {
            Ok(()) => self.delivered.push(channel),
            Err(error) => self.failures.push(ChannelFailure::new(channel, error)),
        }
    }

    /// Failures on channels whose errors are allowed to propagate.
    pub fn essential_failures(&self) -> Vec<ChannelFailure> {
        self.failures
            .iter()
            .filter(|f| !f.channel.is_best_effort())
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// RotationNotifier
// ---------------------------------------------------------------------------

struct EmailChannel {
    mailer: Arc<dyn Mailer>,
    recipient: String,
}

/// Reports rotation outcomes to the log, email, notification store and chat webhooks.
pub struct RotationNotifier {
    log: RotationLog,
    store: Arc<dyn NotificationStore>,
    email: Option<EmailChannel>,
    webhooks: ChatWebhookConfig,
    webhook_delivery: WebhookDelivery,
}

impl RotationNotifier {
    /// Create a notifier with the mandatory log and store channels.
    ///
    /// Email and webhooks stay disabled until configured with
    /// [`with_email`](Self::with_email) and [`with_webhooks`](Self::with_webhooks).
    pub fn new(
        log: RotationLog,
        store: Arc<dyn NotificationStore>,
        webhook_delivery: WebhookDelivery,
    ) -> Self {
        Self {
            log,
            store,
            email: None,
            webhooks: ChatWebhookConfig::default(),
            webhook_delivery,
        }
    }

    pub fn with_email(mut self, mailer: Arc<dyn Mailer>, recipient: impl Into<String>) -> Self {
        self.email = Some(EmailChannel {
            mailer,
            recipient: recipient.into(),
        });
        self
    }

    pub fn with_webhooks(mut self, webhooks: ChatWebhookConfig) -> Self {
        self.webhooks = webhooks;
        self
    }

    /// Deliver `outcome` to every configured channel.
    pub async fn notify(
        &self,
        outcome: &RotationOutcome,
    ) -> Result<FanoutReport, NotificationError> {
        let mut report = FanoutReport::default();

        // The durable record of the attempt goes first.
        let logged = self.log.append(outcome).await.map_err(|e| e.to_string());
        report.record(Channel::Log, logged);

        let record = templates::rotation_notification(outcome);
        let slack = webhook::slack_payload(&record);
        let discord = webhook::discord_payload(&record);

        let (emailed, stored, slack_sent, discord_sent) = tokio::join!(
            self.send_email(outcome),
            self.store.create(&record),
            self.post_webhook(self.webhooks.slack_url.as_deref(), &slack),
            self.post_webhook(self.webhooks.discord_url.as_deref(), &discord),
        );

        if let Some(result) = emailed {
            report.record(Channel::Email, result);
        }
        match stored {
            Ok(notification) => {
                report.delivered.push(Channel::Record);
                report.notification = Some(notification);
            }
            Err(e) => report.record(Channel::Record, Err(e.to_string())),
        }
        if let Some(result) = slack_sent {
            report.record(Channel::Slack, result);
        }
        if let Some(result) = discord_sent {
            report.record(Channel::Discord, result);
        }

        for failure in &report.failures {
            if failure.channel.is_best_effort() || outcome.is_success() {
                tracing::warn!(
                    channel = %failure.channel,
                    error = %failure.error,
                    status = outcome.status_label(),
                    "Rotation notification channel failed"
                );
            } else {
                tracing::error!(
                    channel = %failure.channel,
                    error = %failure.error,
                    status = outcome.status_label(),
                    "Rotation notification channel failed"
                );
            }
        }

        let essential = report.essential_failures();
        if !outcome.is_success() && !essential.is_empty() {
            return Err(NotificationError::Delivery(essential));
        }

        tracing::info!(
            status = outcome.status_label(),
            delivered = report.delivered.len(),
            failed = report.failures.len(),
            "Rotation outcome reported"
        );
        Ok(report)
    }

    /// `None` when email is not configured.
    async fn send_email(&self, outcome: &RotationOutcome) -> Option<Result<(), String>> {
        let Some(channel) = &self.email else {
            tracing::debug!("Email delivery not configured, skipping rotation email");
            return None;
        };
        let email = templates::rotation_email(outcome, &channel.recipient);
        Some(channel.mailer.send(&email).await.map_err(|e| e.to_string()))
    }

    /// `None` when the webhook URL is not configured.
    async fn post_webhook(&self, url: Option<&str>, payload: &Value) -> Option<Result<(), String>> {
        let url = url?;
        Some(
            self.webhook_delivery
                .post_json(url, payload)
                .await
                .map_err(|e| e.to_string()),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use tokio::sync::Mutex;
    use urlist_core::types::DbId;
    use urlist_core::{Secret, SecretRotation};
    use urlist_db::models::notification::{CreateSystemNotification, NotificationPage};
    use urlist_db::MemoryNotificationStore;

    use super::*;
    use crate::delivery::email::{EmailError, OutboundEmail};

    const UNREACHABLE: &str = "http://127.0.0.1:9/webhook";

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutboundEmail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutboundEmail) -> Result<(), EmailError> {
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _email: &OutboundEmail) -> Result<(), EmailError> {
            Err(EmailError::Build("smtp unavailable".to_string()))
        }
    }

    struct FailingStore;

    #[async_trait]
    impl NotificationStore for FailingStore {
        async fn create(
            &self,
            _input: &CreateSystemNotification,
        ) -> Result<SystemNotification, sqlx::Error> {
            Err(sqlx::Error::PoolTimedOut)
        }
        async fn list(
            &self,
            _page: NotificationPage,
        ) -> Result<Vec<SystemNotification>, sqlx::Error> {
            Ok(Vec::new())
        }
        async fn mark_read(&self, _id: DbId) -> Result<bool, sqlx::Error> {
            Ok(false)
        }
        async fn unread_count(&self) -> Result<i64, sqlx::Error> {
            Ok(0)
        }
    }

    fn success_outcome() -> RotationOutcome {
        RotationOutcome::succeeded(SecretRotation {
            old: Some(Secret::generate()),
            new: Secret::generate(),
            backup_path: PathBuf::from(".env.2026-10-16T09-05-07-000Z.backup"),
        })
    }

    fn failure_outcome() -> RotationOutcome {
        RotationOutcome::failed(&std::io::Error::other("read-only file system"))
    }

    fn notifier(dir: &tempfile::TempDir, store: Arc<dyn NotificationStore>) -> RotationNotifier {
        RotationNotifier::new(
            RotationLog::new(dir.path().join("logs").join("jwt-rotation.log")),
            store,
            WebhookDelivery::new().expect("client builds"),
        )
    }

    async fn log_lines(dir: &tempfile::TempDir) -> Vec<String> {
        tokio::fs::read_to_string(dir.path().join("logs").join("jwt-rotation.log"))
            .await
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn success_reaches_every_configured_channel() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryNotificationStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let outcome = success_outcome();

        let report = notifier(&dir, store.clone())
            .with_email(mailer.clone(), "ops@example.com")
            .notify(&outcome)
            .await
            .expect("success outcome never errors");

        assert!(report.failures.is_empty());
        assert_eq!(
            report.delivered,
            vec![Channel::Log, Channel::Email, Channel::Record]
        );

        let lines = log_lines(&dir).await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("] SUCCESS: JWT secret rotated successfully"));

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ops@example.com");

        assert_eq!(store.len().await, 1);
        let record = report.notification.expect("record persisted");
        assert_eq!(record.kind, "success");
        let RotationOutcome::Succeeded { new_secret, .. } = &outcome else {
            unreachable!()
        };
        assert_eq!(record.metadata["new_secret"], new_secret.redacted());
    }

    #[tokio::test]
    async fn webhook_failure_does_not_fail_success_or_block_other_channels() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryNotificationStore::new());
        let mailer = Arc::new(RecordingMailer::default());

        let report = notifier(&dir, store.clone())
            .with_email(mailer.clone(), "ops@example.com")
            .with_webhooks(ChatWebhookConfig {
                slack_url: Some(UNREACHABLE.to_string()),
                discord_url: Some(UNREACHABLE.to_string()),
            })
            .notify(&success_outcome())
            .await
            .expect("webhook failures are swallowed");

        let failed: Vec<_> = report.failures.iter().map(|f| f.channel).collect();
        assert_eq!(failed, vec![Channel::Slack, Channel::Discord]);
        assert!(report.essential_failures().is_empty());

        assert_eq!(log_lines(&dir).await.len(), 1);
        assert_eq!(mailer.sent.lock().await.len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn webhook_failure_never_propagates_even_for_failed_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryNotificationStore::new());

        let report = notifier(&dir, store.clone())
            .with_webhooks(ChatWebhookConfig {
                slack_url: Some(UNREACHABLE.to_string()),
                discord_url: None,
            })
            .notify(&failure_outcome())
            .await
            .expect("only best-effort channels failed");

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].channel, Channel::Slack);
    }

    #[tokio::test]
    async fn failed_rotation_propagates_email_failure_after_other_channels() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryNotificationStore::new());

        let result = notifier(&dir, store.clone())
            .with_email(Arc::new(FailingMailer), "ops@example.com")
            .notify(&failure_outcome())
            .await;

        assert_matches!(
            result,
            Err(NotificationError::Delivery(failures))
                if failures.len() == 1 && failures[0].channel == Channel::Email
        );

        // Log and record were still written.
        let lines = log_lines(&dir).await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("] ERROR: Error updating JWT secret: read-only file system"));

        let records = store.list(NotificationPage::default()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, "error");
        assert_eq!(
            records[0].metadata["error"],
            "Error updating JWT secret: read-only file system"
        );
    }

    #[tokio::test]
    async fn successful_rotation_swallows_email_and_record_failures() {
        let dir = tempfile::tempdir().unwrap();

        let report = notifier(&dir, Arc::new(FailingStore))
            .with_email(Arc::new(FailingMailer), "ops@example.com")
            .notify(&success_outcome())
            .await
            .expect("success outcome never errors");

        let failed: Vec<_> = report.failures.iter().map(|f| f.channel).collect();
        assert_eq!(failed, vec![Channel::Email, Channel::Record]);
        assert_eq!(report.delivered, vec![Channel::Log]);
        assert!(report.notification.is_none());
    }

    #[test]
    fn delivery_error_lists_channels() {
        let err = NotificationError::Delivery(vec![
            ChannelFailure::new(Channel::Email, "smtp down"),
            ChannelFailure::new(Channel::Record, "db down"),
        ]);
        assert_eq!(
            err.to_string(),
            "Notification delivery failed (email: smtp down; record: db down)"
        );
    }
}
