use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use urlist_api::auth::github::GithubClient;
use urlist_api::auth::jwt::TokenService;
use urlist_api::config::ServerConfig;
use urlist_api::router::build_app_router;
use urlist_api::state::AppState;
use urlist_core::{ActiveSecret, Secret, SecretStore, SecretStoreError};
use urlist_db::PgNotificationStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "urlist_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(message) = run().await {
        tracing::error!("{message}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    // --- Configuration ---
    let config = ServerConfig::from_env().map_err(|e| e.to_string())?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Signing secret ---
    let store = SecretStore::new(&config.env_file);
    let secret = load_secret(&store).await?;
    tracing::info!(secret = %secret, config = %store.path().display(), "Signing secret loaded");
    let active = ActiveSecret::new(secret);

    #[cfg(unix)]
    let reload_handle = urlist_api::reload::spawn_reload_on_sighup(store, active.clone())
        .map_err(|e| format!("Failed to install SIGHUP handler: {e}"))?;

    // --- Database ---
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

    let pool = urlist_db::create_pool(&database_url)
        .await
        .map_err(|e| format!("Failed to connect to database: {e}"))?;
    tracing::info!("Database connection pool created");

    urlist_db::health_check(&pool)
        .await
        .map_err(|e| format!("Database health check failed: {e}"))?;
    tracing::info!("Database health check passed");

    urlist_db::run_migrations(&pool)
        .await
        .map_err(|e| format!("Failed to run database migrations: {e}"))?;
    tracing::info!("Database migrations applied");

    // --- GitHub sign-in ---
    let github = GithubClient::new(config.github.clone())
        .map_err(|e| format!("Failed to build GitHub client: {e}"))?;
    if !github.is_configured() {
        tracing::info!("GITHUB_CLIENT_ID/GITHUB_CLIENT_SECRET not set, GitHub sign-in disabled");
    }

    // --- App state ---
    let state = AppState {
        tokens: TokenService::new(active, &config.jwt),
        notifications: Arc::new(PgNotificationStore::new(pool)),
        github,
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state).map_err(|e| e.to_string())?;

    // --- Start server ---
    let host: IpAddr = config
        .host
        .parse()
        .map_err(|e| format!("Invalid HOST address '{}': {e}", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {addr}: {e}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {e}"))?;

    #[cfg(unix)]
    reload_handle.abort();

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Read the signing secret from the configuration file.
///
/// When the file itself is unavailable (for example in a container that
/// injects variables directly) the `JWT_SECRET` environment variable is used.
async fn load_secret(store: &SecretStore) -> Result<Secret, String> {
    match store.active_secret().await {
        Ok(secret) => Ok(secret),
        Err(SecretStoreError::Persistence { .. }) => {
            tracing::warn!(
                config = %store.path().display(),
                "Configuration file unreadable, falling back to JWT_SECRET from the environment"
            );
            let value = std::env::var("JWT_SECRET")
                .map_err(|_| "JWT_SECRET must be set in the environment".to_string())?;
            Secret::parse(value).map_err(|e| e.to_string())
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
