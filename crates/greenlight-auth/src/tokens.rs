//! Token generation and hashing.
//!
//! A plaintext is 16 bytes from the operating system's CSPRNG, base32
//! encoded without padding (26 characters). The stored hash is the SHA-256
//! digest of the raw random bytes, not of the encoded string, so a lookup
//! first decodes the presented plaintext and then hashes it.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use greenlight_models::{Token, TokenScope};

/// Random bytes behind every plaintext.
pub const TOKEN_ENTROPY_BYTES: usize = 16;

/// Creates a new token for `user_id` that expires `ttl` from now.
///
/// Nothing is persisted here; the caller stores [`Token::hash`] and hands
/// [`Token::plaintext`] to the client exactly once.
pub fn generate_token(user_id: i64, ttl: Duration, scope: TokenScope) -> Token {
    let mut random = [0u8; TOKEN_ENTROPY_BYTES];
    OsRng.fill_bytes(&mut random);

    Token {
        plaintext: BASE32_NOPAD.encode(&random),
        hash: digest(&random),
        user_id,
        expiry: expiry_after(ttl),
        scope,
    }
}

/// Hash under which a presented plaintext would have been stored.
///
/// Returns `None` when the plaintext is not valid base32 of the expected
/// length; such a token cannot exist in the store.
pub fn hash_plaintext(plaintext: &str) -> Option<Vec<u8>> {
    let random = BASE32_NOPAD.decode(plaintext.as_bytes()).ok()?;
    if random.len() != TOKEN_ENTROPY_BYTES {
        return None;
    }
    Some(digest(&random))
}

fn digest(bytes: &[u8]) -> Vec<u8> {
    Sha256::digest(bytes).to_vec()
}

fn expiry_after(ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenlight_models::TOKEN_PLAINTEXT_LEN;
    use std::collections::HashSet;

    #[test]
    fn test_plaintext_shape() {
        let token = generate_token(1, Duration::from_secs(60), TokenScope::Activation);
        assert_eq!(token.plaintext.len(), TOKEN_PLAINTEXT_LEN);
        assert!(
            token
                .plaintext
                .chars()
                .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
        );
        assert_eq!(token.user_id, 1);
        assert_eq!(token.scope, TokenScope::Activation);
    }

    #[test]
    fn test_hash_matches_stored_hash() {
        let token = generate_token(7, Duration::from_secs(60), TokenScope::Authentication);
        assert_eq!(hash_plaintext(&token.plaintext), Some(token.hash.clone()));
        assert_eq!(token.hash.len(), 32);
    }

    #[test]
    fn test_hash_is_not_of_encoded_string() {
        let token = generate_token(7, Duration::from_secs(60), TokenScope::Authentication);
        assert_ne!(token.hash, digest(token.plaintext.as_bytes()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let plaintexts: HashSet<String> = (0..1000)
            .map(|_| generate_token(1, Duration::from_secs(60), TokenScope::Authentication))
            .map(|token| token.plaintext)
            .collect();
        assert_eq!(plaintexts.len(), 1000);
    }

    #[test]
    fn test_single_bit_flip_never_matches() {
        let token = generate_token(3, Duration::from_secs(60), TokenScope::Authentication);
        let original = token.plaintext.as_bytes();

        for index in 0..original.len() {
            for bit in 0..8 {
                let mut flipped = original.to_vec();
                flipped[index] ^= 1 << bit;
                let Ok(candidate) = String::from_utf8(flipped) else {
                    continue;
                };
                assert_ne!(hash_plaintext(&candidate), Some(token.hash.clone()));
            }
        }
    }

    #[test]
    fn test_rejects_malformed_plaintext() {
        assert_eq!(hash_plaintext(""), None);
        assert_eq!(hash_plaintext("not base32 at all!"), None);
        assert_eq!(hash_plaintext("MFRGG"), None);
    }

    #[test]
    fn test_expiry_is_ttl_from_now() {
        let before = Utc::now();
        let token = generate_token(1, Duration::from_secs(3600), TokenScope::PasswordReset);
        let after = Utc::now();

        assert!(token.expiry >= before + TimeDelta::seconds(3600));
        assert!(token.expiry <= after + TimeDelta::seconds(3600));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let token = generate_token(1, Duration::MAX, TokenScope::Activation);
        assert_eq!(token.expiry, DateTime::<Utc>::MAX_UTC);
    }
}
