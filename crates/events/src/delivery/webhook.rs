//! Chat-ops webhook delivery (Slack and Discord).
//!
//! [`WebhookDelivery`] sends a JSON payload to an external URL via a single
//! HTTP POST bounded by [`REQUEST_TIMEOUT`]. Delivery is best-effort: callers
//! log failures and move on, so there is no retry loop here.
//!
//! [`slack_payload`] and [`discord_payload`] render a system notification in
//! each service's message format.

use std::time::Duration;

use serde_json::{json, Value};
use urlist_db::models::notification::{CreateSystemNotification, NotificationKind};

/// HTTP request timeout for a single delivery attempt.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// ChatWebhookConfig
// ---------------------------------------------------------------------------

/// Optional chat webhook targets. An absent URL disables that channel.
#[derive(Debug, Clone, Default)]
pub struct ChatWebhookConfig {
    pub slack_url: Option<String>,
    pub discord_url: Option<String>,
}

impl ChatWebhookConfig {
    /// Load webhook URLs from the environment.
    ///
    /// | Variable              | Required | Default  |
    /// |-----------------------|----------|----------|
    /// | `SLACK_WEBHOOK_URL`   | no       | disabled |
    /// | `DISCORD_WEBHOOK_URL` | no       | disabled |
    ///
    /// Empty values are treated as unset.
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            slack_url: read("SLACK_WEBHOOK_URL"),
            discord_url: read("DISCORD_WEBHOOK_URL"),
        }
    }
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Posts JSON payloads to webhook endpoints.
#[derive(Clone)]
pub struct WebhookDelivery {
    client: reqwest::Client,
}

impl WebhookDelivery {
    /// Create a delivery service with a timeout-bounded HTTP client.
    pub fn new() -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Execute a single POST request and check the response status.
    pub async fn post_json(&self, url: &str, payload: &Value) -> Result<(), WebhookError> {
        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

fn slack_color(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Success => "#36a64f",
        NotificationKind::Error => "#ff0000",
        NotificationKind::Warning => "#ffa500",
    }
}

fn discord_color(kind: NotificationKind) -> u32 {
    match kind {
        NotificationKind::Success => 0x36a64f,
        NotificationKind::Error => 0xff0000,
        NotificationKind::Warning => 0xffa500,
    }
}

/// Metadata entries as `(key, display value)` pairs. Strings are shown unquoted.
fn metadata_fields(metadata: &Value) -> Vec<(String, String)> {
    metadata
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(key, value)| {
                    let shown = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key.clone(), shown)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Slack incoming-webhook attachment payload.
pub fn slack_payload(notification: &CreateSystemNotification) -> Value {
    let fields: Vec<Value> = metadata_fields(&notification.metadata)
        .into_iter()
        .map(|(title, value)| json!({ "title": title, "value": value, "short": true }))
        .collect();

    json!({
        "attachments": [{
            "color": slack_color(notification.kind),
            "title": notification.title,
            "text": notification.message,
            "fields": fields,
        }]
    })
}

/// Discord webhook embed payload.
pub fn discord_payload(notification: &CreateSystemNotification) -> Value {
    let fields: Vec<Value> = metadata_fields(&notification.metadata)
        .into_iter()
        .map(|(name, value)| json!({ "name": name, "value": value, "inline": true }))
        .collect();

    json!({
        "embeds": [{
            "title": notification.title,
            "description": notification.message,
            "color": discord_color(notification.kind),
            "fields": fields,
        }]
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
