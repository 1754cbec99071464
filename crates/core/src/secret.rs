//! The token-signing secret and the shared handle used to read it.
//!
//! A [`Secret`] never prints its full value through `Debug` or `Display`; both
//! render the short redacted prefix produced by [`Secret::redacted`]. Call
//! [`Secret::expose`] when the raw value is genuinely needed (signing keys,
//! the persisted configuration, the operator email).

use std::fmt;
use std::sync::Arc;

use rand::RngCore;
use tokio::sync::watch;

use crate::error::CoreError;

/// Number of random bytes in a freshly generated secret (hex-encoded to 64 chars).
pub const SECRET_BYTES: usize = 32;

/// Minimum accepted length of a configured secret, in characters.
pub const MIN_SECRET_LEN: usize = 32;

/// Number of leading characters kept by [`Secret::redacted`].
pub const REDACTED_PREFIX_LEN: usize = 10;

/// An opaque, high-entropy signing secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Generate a new secret from 32 cryptographically random bytes, hex-encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Validate a configured secret value.
    ///
    /// Fails with [`CoreError::Configuration`] when the value is empty or
    /// shorter than [`MIN_SECRET_LEN`].
    pub fn parse(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        if value.is_empty() {
            return Err(CoreError::Configuration("JWT secret is empty".into()));
        }
        if value.len() < MIN_SECRET_LEN {
            return Err(CoreError::Configuration(format!(
                "JWT secret must be at least {MIN_SECRET_LEN} characters long"
            )));
        }
        Ok(Self(value))
    }

    /// Wrap a previously persisted value without length validation.
    ///
    /// Used for the value being rotated away from, which may predate the
    /// current length requirement.
    pub(crate) fn from_persisted(value: String) -> Self {
        Self(value)
    }

    /// The full secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The secret as raw key bytes for HMAC signing.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// A fixed-length prefix followed by `...`, safe for logs and metadata.
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(REDACTED_PREFIX_LEN).collect();
        format!("{prefix}...")
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&self.redacted()).finish()
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

// ---------------------------------------------------------------------------
// ActiveSecret
// ---------------------------------------------------------------------------

/// Shared, cheaply cloneable handle to the secret currently used for signing.
///
/// Readers call [`current`](Self::current) on every use, so a
/// [`replace`](Self::replace) takes effect for the very next token issued or
/// verified. There is exactly one active secret; tokens signed under a
/// replaced secret stop verifying immediately.
#[derive(Clone)]
pub struct ActiveSecret {
    sender: Arc<watch::Sender<Secret>>,
}

impl ActiveSecret {
    pub fn new(secret: Secret) -> Self {
        let (sender, _) = watch::channel(secret);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Snapshot of the active secret.
    pub fn current(&self) -> Secret {
        self.sender.borrow().clone()
    }

    /// Swap in a new active secret. Returns `true` if the value changed.
    pub fn replace(&self, secret: Secret) -> bool {
        let changed = *self.sender.borrow() != secret;
        self.sender.send_replace(secret);
        changed
    }

    /// Receive a notification whenever the active secret is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Secret> {
        self.sender.subscribe()
    }
}

impl fmt::Debug for ActiveSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSecret")
            .field("current", &*self.sender.borrow())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
