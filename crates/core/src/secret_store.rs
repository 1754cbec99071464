//! Persisted signing secret with backup-before-write rotation.
//!
//! [`SecretStore`] owns a `KEY=value` configuration file (normally `.env`).
//! [`SecretStore::rotate`] follows a strict order:
//!
//! 1. read the whole file,
//! 2. write a timestamped full-file backup next to it (`<file>.<stamp>.backup`),
//! 3. write the updated content to a temporary file next to the real file
//!    (symlinks resolved) and rename it over that file.
//!
//! A failure in step 2 aborts before anything is mutated. A failure in step 3
//! leaves the backup in place as an audit trail and the original file intact.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::env_file;
use crate::error::CoreError;
use crate::secret::Secret;
use crate::types::Timestamp;

/// Configuration key holding the active signing secret.
pub const SECRET_KEY: &str = "JWT_SECRET";

/// Suffix of the temporary file written before the atomic rename.
const STAGING_SUFFIX: &str = ".rotating";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for secret store operations.
#[derive(Debug, thiserror::Error)]
pub enum SecretStoreError {
    /// The secret is missing, empty, or too short.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The configuration file or its backup could not be read or written.
    #[error("Persistence error: failed to {action} {path}: {source}")]
    Persistence {
        action: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl SecretStoreError {
    fn persistence(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Persistence {
            action,
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<CoreError> for SecretStoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Configuration(msg) => Self::Configuration(msg),
            other => Self::Configuration(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// SecretRotation
// ---------------------------------------------------------------------------

/// Result of a successful [`SecretStore::rotate`].
#[derive(Debug, Clone)]
pub struct SecretRotation {
    /// The previously persisted value, or `None` if the key was absent.
    pub old: Option<Secret>,
    /// The newly generated and persisted secret.
    pub new: Secret,
    /// Full-file snapshot taken before the write.
    pub backup_path: PathBuf,
}

// ---------------------------------------------------------------------------
// SecretStore
// ---------------------------------------------------------------------------

/// File-backed owner of the active signing secret.
#[derive(Debug)]
pub struct SecretStore {
    path: PathBuf,
    /// Serializes rotations issued through this store.
    rotation_lock: Mutex<()>,
}

impl SecretStore {
    /// Create a store over the configuration file at `path`, keyed by [`SECRET_KEY`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rotation_lock: Mutex::new(()),
        }
    }

    /// Path of the managed configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the currently persisted secret.
    pub async fn active_secret(&self) -> Result<Secret, SecretStoreError> {
        let content = self.read_config().await?;
        let value = env_file::read_value(&content, SECRET_KEY)
            .map_err(|e| {
                SecretStoreError::Configuration(format!(
                    "failed to parse {}: {e}",
                    self.path.display()
                ))
            })?
            .ok_or_else(|| {
                SecretStoreError::Configuration(format!(
                    "{SECRET_KEY} is not set in {}",
                    self.path.display()
                ))
            })?;
        Ok(Secret::parse(value)?)
    }

    /// Generate a new secret, back up the configuration, and persist the new value.
    pub async fn rotate(&self) -> Result<SecretRotation, SecretStoreError> {
        let _guard = self.rotation_lock.lock().await;

        let content = self.read_config().await?;
        let old = match env_file::read_value(&content, SECRET_KEY) {
            Ok(value) => value.filter(|v| !v.is_empty()).map(Secret::from_persisted),
            Err(e) => {
                tracing::warn!(config = %self.path.display(), error = %e, "Previous secret unreadable");
                None
            }
        };
        let new = Secret::generate();

        let backup_path = self.write_backup(&content, Utc::now()).await?;

        let updated = env_file::upsert(&content, SECRET_KEY, new.expose());
        self.replace_config(&updated).await?;

        tracing::info!(
            config = %self.path.display(),
            backup = %backup_path.display(),
            new_secret = %new,
            "Signing secret rotated"
        );

        Ok(SecretRotation {
            old,
            new,
            backup_path,
        })
    }

    async fn read_config(&self) -> Result<String, SecretStoreError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SecretStoreError::persistence("read", &self.path, e))
    }

    /// Write `content` to a backup file that did not exist before.
    async fn write_backup(
        &self,
        content: &str,
        now: Timestamp,
    ) -> Result<PathBuf, SecretStoreError> {
        let stamp = backup_timestamp(now);
        let permissions = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| SecretStoreError::persistence("stat", &self.path, e))?
            .permissions();

        let mut attempt: u32 = 0;
        loop {
            let suffix = if attempt == 0 {
                format!(".{stamp}.backup")
            } else {
                format!(".{stamp}-{attempt}.backup")
            };
            let candidate = with_suffix(&self.path, &suffix);

            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await;

            match file {
                Ok(mut file) => {
                    let written = async {
                        file.set_permissions(permissions.clone()).await?;
                        file.write_all(content.as_bytes()).await?;
                        file.sync_all().await
                    }
                    .await;

                    if let Err(e) = written {
                        let _ = tokio::fs::remove_file(&candidate).await;
                        return Err(SecretStoreError::persistence("write backup", &candidate, e));
                    }
                    return Ok(candidate);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => {
                    return Err(SecretStoreError::persistence("create backup", &candidate, e));
                }
            }
        }
    }

    /// Atomically replace the configuration file with `updated`.
    ///
    /// When the configured path is a symlink, the file it points to is
    /// replaced and the link is left in place.
    async fn replace_config(&self, updated: &str) -> Result<(), SecretStoreError> {
        let target = tokio::fs::canonicalize(&self.path)
            .await
            .map_err(|e| SecretStoreError::persistence("resolve", &self.path, e))?;
        let staging = with_suffix(&target, STAGING_SUFFIX);
        let permissions = tokio::fs::metadata(&target)
            .await
            .map_err(|e| SecretStoreError::persistence("stat", &target, e))?
            .permissions();

        if let Err(e) = tokio::fs::write(&staging, updated).await {
            return Err(SecretStoreError::persistence("write", &staging, e));
        }

        let installed = async {
            tokio::fs::set_permissions(&staging, permissions).await?;
            tokio::fs::rename(&staging, &target).await
        }
        .await;

        if let Err(e) = installed {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(SecretStoreError::persistence("replace", &target, e));
        }
        Ok(())
    }
}

/// ISO-8601 UTC timestamp with `:` and `.` replaced by `-` (filesystem safe).
pub fn backup_timestamp(now: Timestamp) -> String {
    now.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
