//! Operator-triggered rotation of the token-signing secret.
//!
//! [`RotationProcedure::run`] performs one rotation through the
//! [`SecretStore`] and reports the outcome through the [`RotationNotifier`].
//! There are no retries; every call is a distinct rotation event that leaves
//! its own backup.

use urlist_core::{RotationOutcome, SecretRotation, SecretStore, SecretStoreError};
use urlist_events::{FanoutReport, NotificationError, RotationNotifier};

/// Process exit status after a rotation that did not happen.
pub const EXIT_ROTATION_FAILED: i32 = 1;

/// Process exit status when configuration is invalid before rotation starts.
pub const EXIT_CONFIGURATION: i32 = 2;

/// Error type for a rotation attempt.
#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    /// The secret was not rotated. The failure was reported to every channel.
    #[error("{0}")]
    Rotation(#[from] SecretStoreError),

    /// The secret was not rotated, and reporting that failure also failed.
    #[error("{rotation}; reporting the failure also failed: {notification}")]
    Unreported {
        rotation: SecretStoreError,
        notification: NotificationError,
    },
}

impl RotationError {
    /// The store error that stopped the rotation.
    pub fn rotation_error(&self) -> &SecretStoreError {
        match self {
            Self::Rotation(e) | Self::Unreported { rotation: e, .. } => e,
        }
    }
}

/// A rotation that was persisted, with what each channel did with the news.
#[derive(Debug)]
pub struct CompletedRotation {
    pub rotation: SecretRotation,
    pub report: FanoutReport,
}

/// Rotate the persisted secret, then report the outcome.
pub struct RotationProcedure {
    store: SecretStore,
    notifier: RotationNotifier,
}

impl RotationProcedure {
    pub fn new(store: SecretStore, notifier: RotationNotifier) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &SecretStore {
        &self.store
    }

    /// Run one rotation.
    ///
    /// Notification failures after a successful rotation are logged by the
    /// notifier and never turn the result into an error. A failed rotation is
    /// always returned as an error, after best-effort notification.
    pub async fn run(&self) -> Result<CompletedRotation, RotationError> {
        tracing::info!(config = %self.store.path().display(), "Starting secret rotation");

        let rotation = match self.store.rotate().await {
            Ok(rotation) => rotation,
            Err(rotation_err) => {
                tracing::error!(error = %rotation_err, "Secret rotation failed");
                let outcome = RotationOutcome::failed(&rotation_err);
                return match self.notifier.notify(&outcome).await {
                    Ok(_) => Err(RotationError::Rotation(rotation_err)),
                    Err(notification) => Err(RotationError::Unreported {
                        rotation: rotation_err,
                        notification,
                    }),
                };
            }
        };

        let outcome = RotationOutcome::succeeded(rotation.clone());
        let report = match self.notifier.notify(&outcome).await {
            Ok(report) => report,
            // Success outcomes never propagate delivery failures; keep the
            // rotation result regardless.
            Err(e) => {
                tracing::warn!(error = %e, "Rotation notification reported an error");
                FanoutReport::default()
            }
        };

        Ok(CompletedRotation { rotation, report })
    }
}
