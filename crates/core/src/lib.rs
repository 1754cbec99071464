//! Domain building blocks for the urlist credential subsystem.
//!
//! - [`secret`] -- the signing [`Secret`] and the shared [`ActiveSecret`] handle.
//! - [`env_file`] -- targeted `KEY=value` edits that leave unrelated lines alone.
//! - [`secret_store`] -- persisted secret with backup-before-write rotation.
//! - [`rotation`] -- the [`RotationOutcome`] handed to notification fan-out.

pub mod env_file;
pub mod error;
pub mod rotation;
pub mod secret;
pub mod secret_store;
pub mod types;

pub use rotation::RotationOutcome;
pub use secret::{ActiveSecret, Secret};
pub use secret_store::{SecretRotation, SecretStore, SecretStoreError};
