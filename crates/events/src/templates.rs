//! Message bodies for rotation reports and account emails.

use serde_json::json;
use urlist_core::RotationOutcome;
use urlist_db::models::notification::{CreateSystemNotification, NotificationKind};

use crate::delivery::email::OutboundEmail;

/// Shown in place of an old secret that was never configured.
const UNKNOWN_SECRET: &str = "unknown";

/// Escape text for safe inclusion in an HTML body.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// Operator summary email for a rotation attempt.
///
/// The success body carries the old and new secret values in full; email to
/// the operator address is treated as a trusted channel for them.
pub fn rotation_email(outcome: &RotationOutcome, to: &str) -> OutboundEmail {
    let timestamp = outcome.timestamp();

    let (subject, html, text) = match outcome {
        RotationOutcome::Succeeded {
            old_secret,
            new_secret,
            backup_path,
            ..
        } => {
            let old = old_secret
                .as_ref()
                .map(|s| s.expose().to_string())
                .unwrap_or_else(|| UNKNOWN_SECRET.to_string());
            let backup = backup_path.display().to_string();
            let html = format!(
                "<h1>JWT Secret Rotation Completed Successfully</h1>\
                 <p>The JWT secret was rotated at {ts}</p>\
                 <h2>Actions Required:</h2>\
                 <ol>\
                 <li>Update any external services using the old secret</li>\
                 <li>Verify the application is running correctly</li>\
                 <li>Archive the old secret for potential rollback</li>\
                 </ol>\
                 <h2>Details:</h2>\
                 <ul>\
                 <li><strong>Old Secret:</strong> {old}</li>\
                 <li><strong>New Secret:</strong> {new}</li>\
                 <li><strong>Backup File:</strong> {backup}</li>\
                 <li><strong>Rotation Time:</strong> {ts}</li>\
                 </ul>",
                ts = escape_html(&timestamp),
                old = escape_html(&old),
                new = escape_html(new_secret.expose()),
                backup = escape_html(&backup),
            );
            let text = format!(
                "JWT secret rotated at {timestamp}.\n\
                 Old secret: {old}\n\
                 New secret: {new}\n\
                 Backup file: {backup}\n",
                new = new_secret.expose(),
            );
            ("[urlist] JWT Secret Rotation Successful", html, text)
        }
        RotationOutcome::Failed { message, .. } => {
            let html = format!(
                "<h1>JWT Secret Rotation Failed</h1>\
                 <p>An error occurred during JWT secret rotation at {ts}</p>\
                 <h2>Error Details:</h2>\
                 <pre style=\"background-color: #f8d7da; padding: 15px; border-radius: 4px;\">{error}</pre>\
                 <h2>Actions Required:</h2>\
                 <ol>\
                 <li>Check the application logs for more details</li>\
                 <li>Verify the current JWT secret is still valid</li>\
                 <li>Investigate and resolve the error</li>\
                 <li>Manually trigger a new rotation once resolved</li>\
                 </ol>",
                ts = escape_html(&timestamp),
                error = escape_html(message),
            );
            let text = format!("JWT secret rotation failed at {timestamp}.\nError: {message}\n");
            ("[urlist] JWT Secret Rotation Failed", html, text)
        }
    };

    OutboundEmail {
        to: to.to_string(),
        subject: subject.to_string(),
        html,
        text: Some(text),
    }
}

/// The system notification recorded for a rotation attempt.
///
/// Secret values are reduced to their redacted prefix; failures carry the
/// raw error string.
pub fn rotation_notification(outcome: &RotationOutcome) -> CreateSystemNotification {
    let timestamp = outcome.timestamp();

    match outcome {
        RotationOutcome::Succeeded {
            old_secret,
            new_secret,
            backup_path,
            ..
        } => CreateSystemNotification {
            kind: NotificationKind::Success,
            title: "JWT Secret Rotation Successful".to_string(),
            message: format!("JWT secret was successfully rotated at {timestamp}"),
            metadata: json!({
                "timestamp": timestamp,
                "backup_file": backup_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                "old_secret": old_secret
                    .as_ref()
                    .map(|s| s.redacted())
                    .unwrap_or_else(|| UNKNOWN_SECRET.to_string()),
                "new_secret": new_secret.redacted(),
            }),
        },
        RotationOutcome::Failed { message, .. } => CreateSystemNotification {
            kind: NotificationKind::Error,
            title: "JWT Secret Rotation Failed".to_string(),
            message: format!("Failed to rotate JWT secret: {message}"),
            metadata: json!({
                "timestamp": timestamp,
                "error": message,
            }),
        },
    }
}

// ---------------------------------------------------------------------------
// Account emails
// ---------------------------------------------------------------------------

fn action_button(href: &str, label: &str) -> String {
    format!(
        "<a href=\"{href}\" style=\"display:inline-block;padding:12px 24px;background:#7c3aed;\
         color:white;text-decoration:none;border-radius:6px;\">{label}</a>",
        href = escape_html(href),
    )
}

/// Email-address verification message for an opaque verification token.
pub fn verification_email(to: &str, public_url: &str, token: &str) -> OutboundEmail {
    let url = format!("{}/auth/verify/{token}", public_url.trim_end_matches('/'));
    OutboundEmail {
        to: to.to_string(),
        subject: "Verify your email address".to_string(),
        html: format!(
            "<h1>Verify your email address</h1>\
             <p>Please click the button below to verify your email address:</p>{}",
            action_button(&url, "Verify Email")
        ),
        text: Some(format!(
            "Please verify your email address by clicking this link: {url}"
        )),
    }
}

/// Password-reset message for an opaque reset token.
pub fn password_reset_email(to: &str, public_url: &str, token: &str) -> OutboundEmail {
    let url = format!("{}/auth/reset/{token}", public_url.trim_end_matches('/'));
    OutboundEmail {
        to: to.to_string(),
        subject: "Reset your password".to_string(),
        html: format!(
            "<h1>Reset your password</h1>\
             <p>Please click the button below to reset your password:</p>{}\
             <p>This link will expire in 1 hour.</p>",
            action_button(&url, "Reset Password")
        ),
        text: Some(format!("Reset your password by clicking this link: {url}")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use urlist_core::{Secret, SecretRotation};

    use super::*;

    fn success() -> (RotationOutcome, Secret, Secret) {
        let old = Secret::parse(format!("a1b2c3d4e5{}", "0".repeat(54))).unwrap();
        let new = Secret::generate();
        let outcome = RotationOutcome::succeeded(SecretRotation {
            old: Some(old.clone()),
            new: new.clone(),
            backup_path: PathBuf::from("/srv/app/.env.2026-10-16T09-05-07-000Z.backup"),
        });
        (outcome, old, new)
    }

    #[test]
    fn success_email_includes_full_secrets() {
        let (outcome, old, new) = success();
        let email = rotation_email(&outcome, "ops@example.com");

        assert_eq!(email.to, "ops@example.com");
        assert!(email.subject.contains("Successful"));
        assert!(email.html.contains(old.expose()));
        assert!(email.html.contains(new.expose()));
        assert!(email.html.contains(&outcome.timestamp()));
    }

    #[test]
    fn failure_email_escapes_error() {
        let outcome = RotationOutcome::Failed {
            at: chrono::Utc::now(),
            message: "bad <path>".to_string(),
        };
        let email = rotation_email(&outcome, "ops@example.com");
        assert!(email.subject.contains("Failed"));
        assert!(email.html.contains("bad &lt;path&gt;"));
        assert!(email.text.unwrap().contains("bad <path>"));
    }

    #[test]
    fn success_notification_redacts_secrets() {
        let (outcome, old, new) = success();
        let record = rotation_notification(&outcome);

        assert_eq!(record.kind, NotificationKind::Success);
        assert_eq!(record.metadata["old_secret"], "a1b2c3d4e5...");
        assert_eq!(record.metadata["new_secret"], new.redacted());
        assert_eq!(
            record.metadata["backup_file"],
            ".env.2026-10-16T09-05-07-000Z.backup"
        );

        let serialized = record.metadata.to_string();
        assert!(!serialized.contains(old.expose()));
        assert!(!serialized.contains(new.expose()));
    }

    #[test]
    fn failure_notification_carries_raw_error() {
        let outcome = RotationOutcome::Failed {
            at: chrono::Utc::now(),
            message: "Error updating JWT secret: denied".to_string(),
        };
        let record = rotation_notification(&outcome);

        assert_eq!(record.kind, NotificationKind::Error);
        assert_eq!(record.title, "JWT Secret Rotation Failed");
        assert_eq!(record.metadata["error"], "Error updating JWT secret: denied");
    }

    #[test]
    fn account_email_links() {
        let verify = verification_email("u@example.com", "https://urlist.dev/", "tok123");
        assert!(verify.html.contains("https://urlist.dev/auth/verify/tok123"));

        let reset = password_reset_email("u@example.com", "https://urlist.dev", "tok456");
        assert!(reset.html.contains("https://urlist.dev/auth/reset/tok456"));
        assert!(reset.html.contains("expire in 1 hour"));
    }
}
