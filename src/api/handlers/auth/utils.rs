//! Session token helpers.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Create a new session token for the auth cookie.
/// The raw value is only returned to set the cookie; the store keeps a hash.
pub(crate) fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Hash a session token so raw values never reach the session store.
pub(crate) fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

pub(crate) fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_session_token_is_url_safe_and_unique() -> Result<()> {
        let first = generate_session_token()?;
        let second = generate_session_token()?;
        assert_ne!(first, second);
        // 32 bytes encode to 43 unpadded base64url characters.
        assert_eq!(first.len(), 43);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        let decoded = Base64UrlUnpadded::decode_vec(&first)
            .map_err(|err| anyhow::anyhow!("decode session token: {err}"))?;
        assert_eq!(decoded.len(), 32);
        Ok(())
    }

    #[test]
    fn hash_session_token_is_stable() {
        assert_eq!(hash_session_token("abc"), hash_session_token("abc"));
        assert_ne!(hash_session_token("abc"), hash_session_token("abd"));
        assert_eq!(hash_session_token("abc").len(), 32);
    }

    #[test]
    fn now_unix_seconds_is_after_2020() {
        assert!(now_unix_seconds() > 1_577_836_800);
    }
}
