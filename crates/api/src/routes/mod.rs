pub mod auth;
pub mod health;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/github/callback              GitHub sign-in
/// /notifications                     list
/// /notifications/unread-count        unread count
/// /notifications/{id}/read           mark read
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/notifications", notification::router())
}
