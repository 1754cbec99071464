//! GitHub OAuth authorization-code exchange.
//!
//! [`GithubClient::exchange_code`] trades a callback `code` for an access
//! token, then reads the authenticated GitHub user. Matching the identity to
//! a local account is up to the caller.

use std::time::Duration;

use serde::Deserialize;

/// GitHub's OAuth access-token endpoint.
pub const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// GitHub REST API base URL.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Upper bound on each request to GitHub.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// GitHub rejects API requests without a user agent.
const USER_AGENT: &str = concat!("urlist/", env!("CARGO_PKG_VERSION"));

/// Error type for the OAuth code exchange.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("GitHub client credentials not configured")]
    NotConfigured,

    #[error("Failed to get GitHub access token")]
    MissingAccessToken,

    #[error("GitHub request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub returned HTTP {0}")]
    HttpStatus(u16),
}

/// OAuth application credentials.
#[derive(Debug, Clone)]
pub struct GithubOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl GithubOAuthConfig {
    /// Read `GITHUB_CLIENT_ID` and `GITHUB_CLIENT_SECRET`.
    ///
    /// Returns `None` unless both are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Some(Self {
            client_id: read("GITHUB_CLIENT_ID")?,
            client_secret: read("GITHUB_CLIENT_SECRET")?,
        })
    }
}

/// The GitHub account behind an authorization code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubIdentity {
    pub github_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct GithubUser {
    id: i64,
    email: Option<String>,
    name: Option<String>,
}

/// Performs the code exchange against GitHub (or a stand-in server).
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    config: Option<GithubOAuthConfig>,
    token_url: String,
    api_base: String,
}

impl GithubClient {
    pub fn new(config: Option<GithubOAuthConfig>) -> Result<Self, OAuthError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            config,
            token_url: GITHUB_TOKEN_URL.to_string(),
            api_base: GITHUB_API_BASE.to_string(),
        })
    }

    /// Point the client at different token and API endpoints.
    pub fn with_endpoints(mut self, token_url: impl Into<String>, api_base: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.api_base = api_base.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Exchange an authorization `code` for the GitHub identity it grants.
    pub async fn exchange_code(&self, code: &str) -> Result<GithubIdentity, OAuthError> {
        let config = self.config.as_ref().ok_or(OAuthError::NotConfigured)?;

        let response = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({
                "client_id": config.client_id,
                "client_secret": config.client_secret,
                "code": code,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(OAuthError::HttpStatus(response.status().as_u16()));
        }
        // GitHub reports bad codes as a 200 with an `error` field and no token.
        let access_token = response
            .json::<TokenResponse>()
            .await?
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(OAuthError::MissingAccessToken)?;

        let response = self
            .http
            .get(format!("{}/user", self.api_base.trim_end_matches('/')))
            .bearer_auth(&access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(OAuthError::HttpStatus(response.status().as_u16()));
        }
        let user: GithubUser = response.json().await?;

        tracing::info!(github_id = user.id, "GitHub code exchanged");
        Ok(GithubIdentity {
            github_id: user.id.to_string(),
            email: user.email,
            name: user.name,
        })
    }
}
