//! Picking up a rotated secret without a restart.
//!
//! The rotation binary rewrites the configuration file; a running server keeps
//! signing with the old value until it is told to re-read it. On Unix that
//! signal is `SIGHUP`.

use urlist_core::{ActiveSecret, SecretStore, SecretStoreError};

/// Re-read the persisted secret into `active`.
///
/// Returns `true` if the active secret changed. On error the active secret
/// is left as it was.
pub async fn reload_active_secret(
    store: &SecretStore,
    active: &ActiveSecret,
) -> Result<bool, SecretStoreError> {
    let secret = store.active_secret().await?;
    let changed = active.replace(secret);
    if changed {
        tracing::info!(
            config = %store.path().display(),
            secret = %active.current(),
            "Active signing secret reloaded; previously issued tokens are now invalid"
        );
    } else {
        tracing::info!("Signing secret unchanged on reload");
    }
    Ok(changed)
}

/// Reload the active secret every time the process receives `SIGHUP`.
#[cfg(unix)]
pub fn spawn_reload_on_sighup(
    store: SecretStore,
    active: ActiveSecret,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            tracing::info!("Received SIGHUP, reloading signing secret");
            if let Err(e) = reload_active_secret(&store, &active).await {
                tracing::error!(error = %e, "Secret reload failed, keeping current secret");
            }
        }
    }))
}
