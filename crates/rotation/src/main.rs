//! `urlist-rotate-secret` -- rotate the JWT signing secret on demand.
//!
//! Generates a new secret, backs up and rewrites the configuration file, then
//! reports the outcome to the rotation log, the operator email, the system
//! notification table and any configured chat webhooks.
//!
//! # Environment variables
//!
//! | Variable            | Required | Default                 | Description                        |
//! |---------------------|----------|-------------------------|------------------------------------|
//! | `ENV_FILE`          | no       | `.env`                  | Configuration file holding `JWT_SECRET` |
//! | `DATABASE_URL`      | yes      | --                      | Postgres URL for notification records |
//! | `ROTATION_LOG_PATH` | no       | `logs/jwt-rotation.log` | Append-only rotation log           |
//!
//! SMTP and webhook variables are documented on `EmailConfig::from_env` and
//! `ChatWebhookConfig::from_env`.
//!
//! Exits with status 1 when the rotation fails and 2 when configuration is
//! invalid before a rotation can start.

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use urlist_core::SecretStore;
use urlist_db::PgNotificationStore;
use urlist_events::{
    ChatWebhookConfig, EmailConfig, EmailDelivery, RotationLog, RotationNotifier, WebhookDelivery,
};
use urlist_rotation::{RotationProcedure, EXIT_CONFIGURATION, EXIT_ROTATION_FAILED};

/// Default configuration file, relative to the working directory.
const DEFAULT_ENV_FILE: &str = ".env";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "urlist_rotation=info,urlist_events=info,urlist_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let procedure = match build_procedure().await {
        Ok(procedure) => procedure,
        Err(message) => {
            tracing::error!("{message}");
            eprintln!("Configuration error: {message}");
            return ExitCode::from(EXIT_CONFIGURATION as u8);
        }
    };

    match procedure.run().await {
        Ok(completed) => {
            println!("JWT secret rotated successfully.");
            println!("Backup created at {}", completed.rotation.backup_path.display());
            println!("New secret: {}", completed.rotation.new);
            println!();
            println!("Next steps:");
            println!("  1. Restart the application, or send it SIGHUP, to load the new secret");
            println!("  2. Update any external services that use the old secret");
            println!("  3. Existing sessions are now invalid; users must sign in again");
            for failure in &completed.report.failures {
                println!("Warning: {} notification failed: {}", failure.channel, failure.error);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error rotating JWT secret: {e}");
            ExitCode::from(EXIT_ROTATION_FAILED as u8)
        }
    }
}

/// Assemble the store and notifier from the environment.
async fn build_procedure() -> Result<RotationProcedure, String> {
    let env_file = std::env::var("ENV_FILE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV_FILE.to_string());
    let store = SecretStore::new(env_file);

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL environment variable is required".to_string())?;
    let pool = urlist_db::create_pool(&database_url)
        .await
        .map_err(|e| format!("Failed to connect to database: {e}"))?;
    tracing::info!("Database connection established");

    let webhook_delivery =
        WebhookDelivery::new().map_err(|e| format!("Failed to build HTTP client: {e}"))?;

    let log = RotationLog::from_env();
    tracing::info!(log = %log.path().display(), "Rotation log configured");

    let mut notifier = RotationNotifier::new(
        log,
        Arc::new(PgNotificationStore::new(pool)),
        webhook_delivery,
    )
    .with_webhooks(ChatWebhookConfig::from_env());

    match EmailConfig::from_env() {
        Some(config) => match config.alert_recipient.clone() {
            Some(recipient) => {
                tracing::info!(smtp_host = %config.smtp_host, to = %recipient, "Email delivery enabled");
                notifier = notifier.with_email(Arc::new(EmailDelivery::new(config)), recipient);
            }
            None => tracing::warn!(
                "SMTP_HOST is set but neither ROTATION_ALERT_EMAIL nor SMTP_USER is, skipping email"
            ),
        },
        None => tracing::info!("SMTP_HOST not set, email delivery disabled"),
    }

    Ok(RotationProcedure::new(store, notifier))
}
