//! Outcome of a single rotation attempt.
//!
//! A [`RotationOutcome`] is created once per attempt by the rotation procedure,
//! handed to notification fan-out, and then dropped.

use std::path::PathBuf;

use chrono::Utc;

use crate::secret::Secret;
use crate::secret_store::SecretRotation;
use crate::types::Timestamp;

/// Success or failure of one secret rotation, with what operators need to know.
#[derive(Debug, Clone)]
pub enum RotationOutcome {
    Succeeded {
        at: Timestamp,
        message: String,
        old_secret: Option<Secret>,
        new_secret: Secret,
        backup_path: PathBuf,
    },
    Failed {
        at: Timestamp,
        message: String,
    },
}

impl RotationOutcome {
    /// Build a success outcome naming the backup artifact.
    pub fn succeeded(rotation: SecretRotation) -> Self {
        let message = format!(
            "JWT secret rotated successfully. Backup created at {}",
            rotation.backup_path.display()
        );
        Self::Succeeded {
            at: Utc::now(),
            message,
            old_secret: rotation.old,
            new_secret: rotation.new,
            backup_path: rotation.backup_path,
        }
    }

    /// Build a failure outcome from the error that stopped the rotation.
    pub fn failed(error: &dyn std::error::Error) -> Self {
        Self::Failed {
            at: Utc::now(),
            message: format!("Error updating JWT secret: {error}"),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn at(&self) -> Timestamp {
        match self {
            Self::Succeeded { at, .. } | Self::Failed { at, .. } => *at,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Succeeded { message, .. } | Self::Failed { message, .. } => message,
        }
    }

    /// `SUCCESS` or `ERROR`, as written to the rotation log.
    pub fn status_label(&self) -> &'static str {
        if self.is_success() {
            "SUCCESS"
        } else {
            "ERROR"
        }
    }

    /// `at` as an RFC 3339 / ISO-8601 string with millisecond precision.
    pub fn timestamp(&self) -> String {
        self.at().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
