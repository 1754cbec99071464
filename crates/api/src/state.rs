use std::sync::Arc;

use urlist_db::NotificationStore;

use crate::auth::github::GithubClient;
use crate::auth::jwt::TokenService;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Identity tokens, signed with the shared active secret.
    pub tokens: TokenService,
    /// System notification records.
    pub notifications: Arc<dyn NotificationStore>,
    /// GitHub OAuth code exchange; unconfigured when credentials are absent.
    pub github: GithubClient,
}
