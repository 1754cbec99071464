//! End-to-end rotation runs against a temporary configuration directory, the
//! in-memory notification store, a recording mailer and a local webhook
//! receiver.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::sync::Mutex;

use urlist_core::{SecretStore, SecretStoreError};
use urlist_db::models::notification::NotificationPage;
use urlist_db::{MemoryNotificationStore, NotificationStore};
use urlist_events::{
    Channel, ChatWebhookConfig, EmailError, Mailer, OutboundEmail, RotationLog, RotationNotifier,
    WebhookDelivery,
};
use urlist_rotation::{RotationError, RotationProcedure};

const DEADBEEF: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

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
        Err(EmailError::Build("relay refused".to_string()))
    }
}

type Received = Arc<Mutex<Vec<Value>>>;

async fn record_hook(State(received): State<Received>, Json(body): Json<Value>) {
    received.lock().await.push(body);
}

/// Start a local webhook receiver and return its URL and received payloads.
async fn spawn_webhook_receiver() -> (String, Received) {
    let received: Received = Arc::default();
    let app = Router::new()
        .route("/hook", post(record_hook))
        .with_state(received.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/hook"), received)
}

struct Harness {
    dir: tempfile::TempDir,
    env_path: PathBuf,
    store: Arc<MemoryNotificationStore>,
}

impl Harness {
    fn new(env_content: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join(".env");
        if let Some(content) = env_content {
            std::fs::write(&env_path, content).unwrap();
        }
        Self {
            dir,
            env_path,
            store: Arc::new(MemoryNotificationStore::new()),
        }
    }

    fn log_path(&self) -> PathBuf {
        self.dir.path().join("logs").join("jwt-rotation.log")
    }

    fn notifier(&self) -> RotationNotifier {
        RotationNotifier::new(
            RotationLog::new(self.log_path()),
            self.store.clone(),
            WebhookDelivery::new().unwrap(),
        )
    }

    fn procedure(&self, notifier: RotationNotifier) -> RotationProcedure {
        RotationProcedure::new(SecretStore::new(&self.env_path), notifier)
    }

    fn log_lines(&self) -> Vec<String> {
        std::fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn backups(&self) -> Vec<PathBuf> {
        backups_in(self.dir.path())
    }
}

fn backups_in(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.to_string_lossy().ends_with(".backup"))
        .collect();
    found.sort();
    found
}

fn env_content() -> String {
    format!("DATABASE_URL=postgres://localhost/urlist\nJWT_SECRET=\"{DEADBEEF}\"\nPORT=3000\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rotation_persists_backs_up_and_notifies_every_channel() {
    let original = env_content();
    let harness = Harness::new(Some(&original));
    let mailer = Arc::new(RecordingMailer::default());
    let (hook_url, received) = spawn_webhook_receiver().await;

    let notifier = harness
        .notifier()
        .with_email(mailer.clone(), "ops@example.com")
        .with_webhooks(ChatWebhookConfig {
            slack_url: Some(hook_url.clone()),
            discord_url: Some(hook_url),
        });
    let procedure = harness.procedure(notifier);

    let completed = procedure.run().await.expect("rotation succeeds");

    // Active secret changed to a fresh 64-hex value.
    let active = procedure.store().active_secret().await.unwrap();
    assert_eq!(active, completed.rotation.new);
    assert_ne!(active.expose(), DEADBEEF);
    assert_eq!(active.expose().len(), 64);
    assert!(active.expose().chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(completed.rotation.old.as_ref().unwrap().expose(), DEADBEEF);

    // Exactly one backup, holding the pre-rotation file verbatim.
    let backups = harness.backups();
    assert_eq!(backups, vec![completed.rotation.backup_path.clone()]);
    assert_eq!(std::fs::read_to_string(&backups[0]).unwrap(), original);

    // Unrelated entries are untouched.
    let rewritten = std::fs::read_to_string(&harness.env_path).unwrap();
    assert!(rewritten.starts_with("DATABASE_URL=postgres://localhost/urlist\n"));
    assert!(rewritten.ends_with("PORT=3000\n"));

    // One SUCCESS log line.
    let lines = harness.log_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("] SUCCESS: JWT secret rotated successfully. Backup created at"));

    // One success record with redacted secrets.
    let records = harness.store.list(NotificationPage::default()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, "success");
    assert_eq!(records[0].metadata["old_secret"], "deadbeefde...");
    let metadata = records[0].metadata.to_string();
    assert!(!metadata.contains(DEADBEEF));
    assert!(!metadata.contains(active.expose()));

    // Operator email carries the full values.
    let sent = mailer.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].html.contains(DEADBEEF));
    assert!(sent[0].html.contains(active.expose()));

    // Both webhooks were delivered.
    let payloads = received.lock().await;
    assert_eq!(payloads.len(), 2);
    assert!(payloads.iter().any(|p| p.get("attachments").is_some()));
    assert!(payloads.iter().any(|p| p.get("embeds").is_some()));
    assert!(completed.report.failures.is_empty());
}

#[tokio::test]
async fn repeated_rotations_are_independent_events() {
    let harness = Harness::new(Some(&env_content()));
    let procedure = harness.procedure(harness.notifier());

    let first = procedure.run().await.unwrap();
    let second = procedure.run().await.unwrap();

    assert_ne!(first.rotation.new, second.rotation.new);
    assert_eq!(second.rotation.old.as_ref(), Some(&first.rotation.new));
    assert_eq!(harness.backups().len(), 2);
    assert_eq!(harness.log_lines().len(), 2);
    assert_eq!(harness.store.len().await, 2);
}

#[tokio::test]
async fn unreachable_webhook_does_not_fail_rotation() {
    let harness = Harness::new(Some(&env_content()));
    let mailer = Arc::new(RecordingMailer::default());
    let notifier = harness
        .notifier()
        .with_email(mailer.clone(), "ops@example.com")
        .with_webhooks(ChatWebhookConfig {
            slack_url: Some("http://127.0.0.1:9/hook".to_string()),
            discord_url: None,
        });

    let completed = harness
        .procedure(notifier)
        .run()
        .await
        .expect("webhook failure is swallowed");

    assert_eq!(completed.report.failures.len(), 1);
    assert_eq!(completed.report.failures[0].channel, Channel::Slack);
    assert_eq!(harness.log_lines().len(), 1);
    assert_eq!(mailer.sent.lock().await.len(), 1);
    assert_eq!(harness.store.len().await, 1);
}

#[tokio::test]
async fn failed_rotation_is_reported_and_returned() {
    // No configuration file at all.
    let harness = Harness::new(None);
    let mailer = Arc::new(RecordingMailer::default());
    let notifier = harness
        .notifier()
        .with_email(mailer.clone(), "ops@example.com");

    let result = harness.procedure(notifier).run().await;

    assert_matches!(
        result,
        Err(RotationError::Rotation(SecretStoreError::Persistence { action: "read", .. }))
    );
    assert!(harness.backups().is_empty());
    assert!(!harness.env_path.exists());

    let lines = harness.log_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("] ERROR: Error updating JWT secret: "));

    let records = harness.store.list(NotificationPage::default()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, "error");
    assert!(records[0].metadata["error"]
        .as_str()
        .unwrap()
        .starts_with("Error updating JWT secret: "));

    let sent = mailer.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("Failed"));
}

#[tokio::test]
async fn failed_rotation_with_failed_email_surfaces_both() {
    let harness = Harness::new(None);
    let notifier = harness
        .notifier()
        .with_email(Arc::new(FailingMailer), "ops@example.com");

    let err = harness
        .procedure(notifier)
        .run()
        .await
        .expect_err("rotation cannot succeed without a file");

    assert_matches!(&err, RotationError::Unreported { .. });
    assert_matches!(err.rotation_error(), SecretStoreError::Persistence { .. });
    assert!(err.to_string().contains("email: "));

    // The log line and record were still written.
    assert_eq!(harness.log_lines().len(), 1);
    assert_eq!(harness.store.len().await, 1);
}

#[tokio::test]
async fn write_failure_leaves_active_secret_unchanged() {
    let original = env_content();
    let harness = Harness::new(Some(&original));
    // A directory squatting on the staging path makes the write fail.
    std::fs::create_dir(harness.dir.path().join(".env.rotating")).unwrap();

    let procedure = harness.procedure(harness.notifier());
    let result = procedure.run().await;

    assert_matches!(result, Err(RotationError::Rotation(SecretStoreError::Persistence { .. })));
    assert_eq!(std::fs::read_to_string(&harness.env_path).unwrap(), original);
    assert_eq!(procedure.store().active_secret().await.unwrap().expose(), DEADBEEF);
    assert!(harness.log_lines()[0].contains("] ERROR: "));
}
