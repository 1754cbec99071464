//! Identity-token issuance and verification.
//!
//! Identity tokens are HS256-signed JWTs carrying a [`Claims`] payload. They
//! are signed with whatever the [`ActiveSecret`] holds at the moment of the
//! call, so replacing the active secret invalidates every outstanding token
//! at once. There is no grace window for the previous secret.

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use urlist_core::error::CoreError;
use urlist_core::types::Timestamp;
use urlist_core::ActiveSecret;
use uuid::Uuid;

/// Default identity token lifetime in days.
pub const DEFAULT_TOKEN_EXPIRY_DAYS: i64 = 7;

/// JWT claims embedded in every identity token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The subject's user id.
    pub id: String,
    pub email: String,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

/// Who a token was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub id: String,
    pub email: String,
}

/// Configuration for identity tokens.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Token lifetime in days (default: 7).
    pub token_expiry_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            token_expiry_days: DEFAULT_TOKEN_EXPIRY_DAYS,
        }
    }
}

impl JwtConfig {
    /// Load token configuration from environment variables.
    ///
    /// | Env Var                 | Required | Default |
    /// |-------------------------|----------|---------|
    /// | `JWT_TOKEN_EXPIRY_DAYS` | no       | `7`     |
    ///
    /// The signing secret itself is owned by the secret store, not this config.
    pub fn from_env() -> Result<Self, CoreError> {
        let token_expiry_days = match std::env::var("JWT_TOKEN_EXPIRY_DAYS") {
            Ok(raw) => raw.parse().map_err(|_| {
                CoreError::Configuration("JWT_TOKEN_EXPIRY_DAYS must be a valid i64".into())
            })?,
            Err(_) => DEFAULT_TOKEN_EXPIRY_DAYS,
        };
        if token_expiry_days <= 0 {
            return Err(CoreError::Configuration(
                "JWT_TOKEN_EXPIRY_DAYS must be positive".into(),
            ));
        }
        Ok(Self { token_expiry_days })
    }
}

/// Issues and verifies identity tokens against the active secret.
#[derive(Debug, Clone)]
pub struct TokenService {
    secret: ActiveSecret,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: ActiveSecret, config: &JwtConfig) -> Self {
        Self {
            secret,
            lifetime: Duration::days(config.token_expiry_days),
        }
    }

    /// The shared handle this service signs with.
    pub fn active_secret(&self) -> &ActiveSecret {
        &self.secret
    }

    /// Sign a token for `subject`, valid from now for the configured lifetime.
    pub fn issue_token(&self, subject: &TokenSubject) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_token_at(subject, chrono::Utc::now())
    }

    /// Sign a token as if issued at `issued_at`.
    pub fn issue_token_at(
        &self,
        subject: &TokenSubject,
        issued_at: Timestamp,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            id: subject.id.clone(),
            email: subject.email.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let secret = self.secret.current();
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Verify signature and expiry, returning the subject on success.
    ///
    /// Malformed input, a bad signature and an expired token all yield `None`.
    pub fn verify_token(&self, token: &str) -> Option<TokenSubject> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let secret = self.secret.current();
        match decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation) {
            Ok(data) => Some(TokenSubject {
                id: data.claims.id,
                email: data.claims.email,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "Identity token rejected");
                None
            }
        }
    }
}
