use std::path::PathBuf;

use urlist_core::error::CoreError;

use crate::auth::github::GithubOAuthConfig;
use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Configuration file holding `JWT_SECRET`, re-read on SIGHUP.
    pub env_file: PathBuf,
    /// Identity token settings.
    pub jwt: JwtConfig,
    /// GitHub OAuth credentials, when configured.
    pub github: Option<GithubOAuthConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `ENV_FILE`             | `.env`                     |
    pub fn from_env() -> Result<Self, CoreError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = parse_var("PORT", "3000")?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_var("REQUEST_TIMEOUT_SECS", "30")?;

        let env_file = std::env::var("ENV_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| ".env".into());

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            env_file: PathBuf::from(env_file),
            jwt: JwtConfig::from_env()?,
            github: GithubOAuthConfig::from_env(),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, CoreError> {
    std::env::var(name)
        .unwrap_or_else(|_| default.into())
        .parse()
        .map_err(|_| CoreError::Configuration(format!("{name} has an invalid value")))
}
