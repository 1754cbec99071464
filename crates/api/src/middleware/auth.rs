//! Identity-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use tower_cookies::Cookies;

use crate::error::AppError;
use crate::state::AppState;

/// Cookie that carries the identity token for browser sessions.
pub const AUTH_COOKIE: &str = "auth_token";

/// Authenticated caller extracted from the `auth_token` cookie or a Bearer token.
///
/// Every failure (no token, malformed, bad signature, expired) produces the
/// same 401 response.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Absent only when the cookie layer is not installed; Bearer still works.
        let cookies = Cookies::from_request_parts(parts, state).await.ok();

        let token = cookies
            .as_ref()
            .and_then(cookie_token)
            .or_else(|| bearer_token(&parts.headers))
            .ok_or_else(|| AppError::unauthenticated("no identity token presented"))?;

        let subject = state
            .tokens
            .verify_token(&token)
            .ok_or_else(|| AppError::unauthenticated("identity token failed verification"))?;

        Ok(AuthUser {
            id: subject.id,
            email: subject.email,
        })
    }
}

/// The identity token from the `auth_token` cookie, with any surrounding quotes removed.
fn cookie_token(cookies: &Cookies) -> Option<String> {
    cookies
        .get(AUTH_COOKIE)
        .map(|c| c.value_trimmed().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// The identity token from an `Authorization: Bearer` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
