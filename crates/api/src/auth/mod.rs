//! Authentication primitives.
//!
//! - [`jwt`] -- identity-token issuance and verification against the active secret.
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`tokens`] -- opaque tokens for verification and reset links.
//! - [`github`] -- GitHub OAuth code exchange.

pub mod github;
pub mod jwt;
pub mod password;
pub mod tokens;
