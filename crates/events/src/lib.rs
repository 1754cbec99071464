//! Notification fan-out for secret rotation.
//!
//! This crate reports a [`RotationOutcome`](urlist_core::RotationOutcome) to
//! every configured channel:
//!
//! - [`RotationLog`] -- durable append-only log, always written first.
//! - [`delivery::email`] -- SMTP summary email to the operator.
//! - [`NotificationStore`](urlist_db::NotificationStore) -- persisted system notification.
//! - [`delivery::webhook`] -- best-effort Slack and Discord posts.
//!
//! [`RotationNotifier`] ties them together with per-channel failure isolation.

pub mod delivery;
pub mod fanout;
pub mod rotation_log;
pub mod templates;

pub use delivery::email::{EmailConfig, EmailDelivery, EmailError, Mailer, OutboundEmail};
pub use delivery::webhook::{ChatWebhookConfig, WebhookDelivery, WebhookError};
pub use fanout::{Channel, ChannelFailure, FanoutReport, NotificationError, RotationNotifier};
pub use rotation_log::RotationLog;
