//! Route definitions for `/auth`.

use axum::routing::get;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// GET    /github/callback           -> github_callback
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/github/callback", get(auth::github_callback))
}
