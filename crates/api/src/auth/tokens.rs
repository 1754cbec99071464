//! Opaque random tokens for email-verification and password-reset links.
//!
//! These carry no expiry of their own; the record that stores a token owns
//! its lifetime.

use rand::Rng;

/// Length of an opaque token, in characters.
pub const OPAQUE_TOKEN_LEN: usize = 32;

const URL_SAFE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Generate a [`OPAQUE_TOKEN_LEN`]-character token from the URL-safe alphabet.
pub fn generate_opaque_token() -> String {
    let mut rng = rand::rng();
    (0..OPAQUE_TOKEN_LEN)
        .map(|_| URL_SAFE_ALPHABET[rng.random_range(0..URL_SAFE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn token_is_32_url_safe_chars() {
        let token = generate_opaque_token();
        assert_eq!(token.len(), OPAQUE_TOKEN_LEN);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn tokens_do_not_repeat() {
        let tokens: HashSet<_> = (0..100).map(|_| generate_opaque_token()).collect();
        assert_eq!(tokens.len(), 100);
    }
}
