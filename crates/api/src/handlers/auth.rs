//! Handlers for `/auth`: GitHub sign-in.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::auth::github::OAuthError;
use crate::auth::jwt::TokenSubject;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AUTH_COOKIE;
use crate::state::AppState;

/// Query parameters GitHub appends to the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct GithubCallbackQuery {
    pub code: Option<String>,
}

/// GET /api/v1/auth/github/callback
///
/// Exchange the authorization code, issue an identity token for the GitHub
/// account, and set it as the `auth_token` cookie. The token subject id is
/// `github:<account id>`; linking it to a local account is left to the
/// account service.
pub async fn github_callback(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<GithubCallbackQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let code = params
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".into()))?;

    let identity = state.github.exchange_code(&code).await.map_err(|e| match e {
        OAuthError::NotConfigured => AppError::BadRequest("GitHub sign-in is not configured".into()),
        OAuthError::MissingAccessToken | OAuthError::HttpStatus(_) => {
            AppError::unauthenticated("GitHub rejected the authorization code")
        }
        OAuthError::Request(e) => AppError::InternalError(format!("GitHub request failed: {e}")),
    })?;

    let email = identity
        .email
        .clone()
        .ok_or_else(|| AppError::BadRequest("GitHub account has no public email".into()))?;
    let subject = TokenSubject {
        id: format!("github:{}", identity.github_id),
        email,
    };

    let token = state
        .tokens
        .issue_token(&subject)
        .map_err(|e| AppError::InternalError(format!("Failed to sign identity token: {e}")))?;

    let cookie = Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    cookies.add(cookie);

    tracing::info!(user = %subject.id, "GitHub sign-in completed");
    Ok(Json(serde_json::json!({
        "data": {
            "id": subject.id,
            "email": subject.email,
            "name": identity.name,
        }
    })))
}
