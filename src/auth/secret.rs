//! Shared HMAC signing key
//!
//! The key is supplied hex-encoded through `HMAC_KEY`, decoded once at
//! startup and shared read-only by every codec clone afterwards.

use crate::auth::tokens::TokenError;
use std::fmt;
use zeroize::Zeroizing;

/// Environment variable holding the hex-encoded signing key
pub const HMAC_KEY_ENV: &str = "HMAC_KEY";

/// Raw HMAC key bytes. Never empty.
#[derive(Clone)]
pub struct HmacSecret {
    bytes: Zeroizing<Vec<u8>>,
}

impl HmacSecret {
    /// Wrap raw key bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TokenError> {
        let bytes = Zeroizing::new(bytes);
        if bytes.is_empty() {
            return Err(TokenError::Config("No HMAC key set".to_string()));
        }
        Ok(Self { bytes })
    }

    /// Decode a hex-encoded key. Surrounding whitespace is rejected like any
    /// other non-hex character. The input is not echoed back on failure.
    pub fn from_hex(value: &str) -> Result<Self, TokenError> {
        let bytes = hex::decode(value)
            .map_err(|_| TokenError::Config("HMAC key is not valid hex".to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Load the key from `HMAC_KEY`
    pub fn from_env() -> Result<Self, TokenError> {
        let value = std::env::var(HMAC_KEY_ENV)
            .map_err(|_| TokenError::Config(format!("{} is not set", HMAC_KEY_ENV)))?;
        Self::from_hex(&value)
    }

    /// Key length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for HmacSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HmacSecret([REDACTED])")
    }
}
