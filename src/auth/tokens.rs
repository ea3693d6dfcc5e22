//! Stream key encoding and verification
//!
//! Token layout: `<prefix><identifier>.<signature>`
//!
//! Prefixes:
//! - `live_` : Publisher key (WHIP ingest)
//! - `play_` : Viewer key (WHEP playback)
//!
//! The signature is HMAC-SHA256 over everything before the last `.`,
//! encoded as unpadded URL-safe base64. Identifiers may contain `.`; only
//! the final segment is the signature.

use crate::auth::secret::HmacSecret;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Token prefixes
pub const WHIP_PREFIX: &str = "live_";
pub const WHEP_PREFIX: &str = "play_";

/// Framing prefix of a credential taken from an `Authorization` header
pub const BEARER_PREFIX: &str = "Bearer ";

/// Characters of a token kept by [`redact_token`]
const REDACTED_VISIBLE_CHARS: usize = 8;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid stream key: unsupported prefix, expected '{expected}'")]
    UnsupportedRole { expected: &'static str },

    #[error("invalid stream key: no authenticator")]
    MissingAuthenticator,

    #[error("invalid stream key: malformed authenticator")]
    MalformedAuthenticator,

    #[error("invalid stream key: malformed credential")]
    MalformedToken,

    #[error("invalid stream key: bad authenticator")]
    BadAuthenticator,
}

impl TokenError {
    /// Missing or malformed secret. Fatal to the caller, never retried.
    pub fn is_config(&self) -> bool {
        matches!(self, TokenError::Config(_))
    }

    /// Collapse into the outcome shown to unauthenticated parties
    pub fn into_opaque(self) -> AuthFailure {
        AuthFailure(())
    }
}

/// Single opaque authentication outcome. Carries no detail about why a
/// credential was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("authentication failed")]
pub struct AuthFailure(());

impl From<TokenError> for AuthFailure {
    fn from(err: TokenError) -> Self {
        err.into_opaque()
    }
}

/// Which side of a stream a key grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Pushes media in over WHIP
    Publisher,
    /// Pulls media out over WHEP
    Viewer,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Publisher, Role::Viewer];

    pub fn prefix(&self) -> &'static str {
        match self {
            Role::Publisher => WHIP_PREFIX,
            Role::Viewer => WHEP_PREFIX,
        }
    }

    /// Signaling protocol the role is used with
    pub fn protocol(&self) -> &'static str {
        match self {
            Role::Publisher => "whip",
            Role::Viewer => "whep",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.protocol())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "publisher" | "whip" => Ok(Role::Publisher),
            "viewer" | "whep" => Ok(Role::Viewer),
            _ => Err(format!(
                "Invalid role: {}. Must be publisher (whip) or viewer (whep)",
                s
            )),
        }
    }
}

/// Loggable form of a presented token: the first few characters of the
/// payload, never the signature.
pub fn redact_token(token: &str) -> String {
    let payload_end = token.rfind('.').unwrap_or(token.len());
    let head: String = token[..payload_end]
        .chars()
        .take(REDACTED_VISIBLE_CHARS)
        .collect();
    format!("{}…", head)
}

/// Strip the `Bearer ` framing from a presented credential
pub fn strip_bearer(credential: &str) -> Result<&str, TokenError> {
    credential
        .strip_prefix(BEARER_PREFIX)
        .ok_or(TokenError::MalformedToken)
}

/// Signs and verifies stream keys with a shared secret.
///
/// Cloning is cheap; clones share the same secret.
#[derive(Debug, Clone)]
pub struct StreamKeyCodec {
    secret: Arc<HmacSecret>,
}

impl StreamKeyCodec {
    pub fn new(secret: HmacSecret) -> Self {
        Self {
            secret: Arc::new(secret),
        }
    }

    /// Build a codec from `HMAC_KEY`
    pub fn from_env() -> Result<Self, TokenError> {
        HmacSecret::from_env().map(Self::new)
    }

    /// Sign `identifier` for `role`
    pub fn encode(&self, identifier: &str, role: Role) -> String {
        let payload = format!("{}{}", role.prefix(), identifier);
        let signature = self.signature(payload.as_bytes());
        format!("{}.{}", payload, signature)
    }

    /// Sign an identifier that need not be UTF-8. The prefix, separator and
    /// signature are ASCII; the identifier bytes are copied through as is.
    pub fn encode_bytes(&self, identifier: &[u8], role: Role) -> Vec<u8> {
        let mut payload = Vec::with_capacity(role.prefix().len() + identifier.len() + 44);
        payload.extend_from_slice(role.prefix().as_bytes());
        payload.extend_from_slice(identifier);
        let signature = self.signature(&payload);
        payload.push(b'.');
        payload.extend_from_slice(signature.as_bytes());
        payload
    }

    /// Verify a `Bearer `-framed credential and return the identifier
    pub fn decode(&self, credential: &str, role: Role) -> Result<String, TokenError> {
        let token = strip_bearer(credential).inspect_err(|_| {
            debug!(role = %role, "stream key rejected: missing bearer framing");
        })?;
        self.decode_token(token, role)
    }

    /// Verify an unframed token and return the identifier
    pub fn decode_token(&self, token: &str, role: Role) -> Result<String, TokenError> {
        self.verify(token, role).inspect_err(|e| {
            debug!(
                role = %role,
                token = %redact_token(token),
                error = %e,
                "stream key rejected"
            );
        })
    }

    pub fn encode_whip(&self, identifier: &str) -> String {
        self.encode(identifier, Role::Publisher)
    }

    pub fn encode_whep(&self, identifier: &str) -> String {
        self.encode(identifier, Role::Viewer)
    }

    pub fn decode_whip(&self, credential: &str) -> Result<String, TokenError> {
        self.decode(credential, Role::Publisher)
    }

    pub fn decode_whep(&self, credential: &str) -> Result<String, TokenError> {
        self.decode(credential, Role::Viewer)
    }

    fn verify(&self, token: &str, role: Role) -> Result<String, TokenError> {
        let prefix = role.prefix();
        if !token.starts_with(prefix) {
            return Err(TokenError::UnsupportedRole { expected: prefix });
        }

        let dot = token.rfind('.').ok_or(TokenError::MissingAuthenticator)?;

        let expected = URL_SAFE_NO_PAD
            .decode(&token[dot + 1..])
            .map_err(|_| TokenError::MalformedAuthenticator)?;

        if self.secret.is_empty() {
            return Err(TokenError::Config("No HMAC key set".to_string()));
        }

        // verify_slice compares in constant time
        self.mac(token[..dot].as_bytes())
            .verify_slice(&expected)
            .map_err(|_| TokenError::BadAuthenticator)?;

        Ok(token[prefix.len()..dot].to_string())
    }

    fn signature(&self, payload: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(self.mac(payload).finalize().into_bytes())
    }

    fn mac(&self, payload: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        mac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY_HEX: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

    fn codec() -> StreamKeyCodec {
        StreamKeyCodec::new(HmacSecret::from_hex(TEST_KEY_HEX).unwrap())
    }

    fn bearer(token: &str) -> String {
        format!("{}{}", BEARER_PREFIX, token)
    }

    #[test]
    fn test_encode_layout() {
        let token = codec().encode("alice", Role::Publisher);
        let (payload, signature) = token.rsplit_once('.').unwrap();

        assert_eq!(payload, "live_alice");
        // 32-byte digest, unpadded
        assert_eq!(signature.len(), 43);
        assert!(!signature.contains('='));
        assert!(!signature.contains('+') && !signature.contains('/'));
    }

    #[test]
    fn test_encode_decode() {
        let codec = codec();
        let token = codec.encode_whip("alice");
        assert_eq!(codec.decode_whip(&bearer(&token)).unwrap(), "alice");

        let token = codec.encode_whep("alice");
        assert_eq!(codec.decode_whep(&bearer(&token)).unwrap(), "alice");
    }

    #[test]
    fn test_empty_identifier() {
        let codec = codec();
        let token = codec.encode("", Role::Viewer);
        assert!(token.starts_with("play_."));
        assert_eq!(codec.decode_token(&token, Role::Viewer).unwrap(), "");
    }

    #[test]
    fn test_identifier_with_dots() {
        let codec = codec();
        let token = codec.encode("studio.a.main", Role::Publisher);
        assert_eq!(
            codec.decode_token(&token, Role::Publisher).unwrap(),
            "studio.a.main"
        );
    }

    #[test]
    fn test_wrong_role() {
        let codec = codec();
        let token = codec.encode("alice", Role::Publisher);
        assert_eq!(
            codec.decode_token(&token, Role::Viewer),
            Err(TokenError::UnsupportedRole {
                expected: WHEP_PREFIX
            })
        );
    }

    #[test]
    fn test_missing_authenticator() {
        assert_eq!(
            codec().decode_token("live_alice", Role::Publisher),
            Err(TokenError::MissingAuthenticator)
        );
    }

    #[test]
    fn test_malformed_authenticator() {
        assert_eq!(
            codec().decode_token("live_alice.not*base64!", Role::Publisher),
            Err(TokenError::MalformedAuthenticator)
        );
    }

    #[test]
    fn test_truncated_authenticator() {
        let codec = codec();
        let token = codec.encode("alice", Role::Publisher);
        let (payload, signature) = token.rsplit_once('.').unwrap();

        // 40 characters decode cleanly to 30 bytes
        let short = format!("{}.{}", payload, &signature[..40]);
        assert_eq!(
            codec.decode_token(&short, Role::Publisher),
            Err(TokenError::BadAuthenticator)
        );
    }

    #[test]
    fn test_impossible_authenticator_length() {
        let codec = codec();
        let token = codec.encode("alice", Role::Publisher);
        let (payload, signature) = token.rsplit_once('.').unwrap();

        // 4n+1 characters can never be valid base64
        let short = format!("{}.{}", payload, &signature[..21]);
        assert_eq!(
            codec.decode_token(&short, Role::Publisher),
            Err(TokenError::MalformedAuthenticator)
        );
    }

    #[test]
    fn test_encode_bytes_matches_encode() {
        let codec = codec();
        for role in Role::ALL {
            assert_eq!(
                codec.encode_bytes(b"studio.a", role),
                codec.encode("studio.a", role).into_bytes()
            );
        }
    }

    #[test]
    fn test_encode_bytes_non_utf8() {
        let codec = codec();
        let token = codec.encode_bytes(b"bad\xff", Role::Publisher);

        assert!(token.starts_with(b"live_bad\xff."));
        let dot = token.iter().rposition(|&b| b == b'.').unwrap();
        let signature = URL_SAFE_NO_PAD.decode(&token[dot + 1..]).unwrap();

        let mut mac = HmacSha256::new_from_slice(&hex::decode(TEST_KEY_HEX).unwrap()).unwrap();
        mac.update(b"live_bad\xff");
        assert!(mac.verify_slice(&signature).is_ok());
    }

    #[test]
    fn test_empty_authenticator() {
        assert_eq!(
            codec().decode_token("live_alice.", Role::Publisher),
            Err(TokenError::BadAuthenticator)
        );
    }

    #[test]
    fn test_tampered_identifier() {
        let codec = codec();
        let token = codec.encode("alice", Role::Publisher);
        let forged = token.replacen("alice", "mallory", 1);
        assert_eq!(
            codec.decode_token(&forged, Role::Publisher),
            Err(TokenError::BadAuthenticator)
        );
    }

    #[test]
    fn test_decode_requires_bearer() {
        let codec = codec();
        let token = codec.encode("alice", Role::Publisher);
        assert_eq!(
            codec.decode(&token, Role::Publisher),
            Err(TokenError::MalformedToken)
        );
    }

    #[test]
    fn test_decode_short_credential() {
        let codec = codec();
        assert_eq!(codec.decode("", Role::Publisher), Err(TokenError::MalformedToken));
        assert_eq!(
            codec.decode("Bear", Role::Publisher),
            Err(TokenError::MalformedToken)
        );
    }

    #[test]
    fn test_decode_bearer_only() {
        assert!(matches!(
            codec().decode(BEARER_PREFIX, Role::Publisher),
            Err(TokenError::UnsupportedRole { .. })
        ));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("publisher".parse::<Role>().unwrap(), Role::Publisher);
        assert_eq!("WHIP".parse::<Role>().unwrap(), Role::Publisher);
        assert_eq!("viewer".parse::<Role>().unwrap(), Role::Viewer);
        assert_eq!("whep".parse::<Role>().unwrap(), Role::Viewer);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_prefixes_distinct() {
        assert_ne!(Role::Publisher.prefix(), Role::Viewer.prefix());
        assert_eq!(Role::Publisher.to_string(), "whip");
        assert_eq!(Role::Viewer.to_string(), "whep");
    }

    #[test]
    fn test_redact_token_hides_signature() {
        let token = codec().encode("a-rather-long-stream-name", Role::Publisher);
        let signature = token.rsplit_once('.').unwrap().1;
        let redacted = redact_token(&token);

        assert_eq!(redacted, "live_a-r…");
        assert!(!redacted.contains(signature));
        assert_eq!(redact_token("ab"), "ab…");
    }

    #[test]
    fn test_errors_are_opaque() {
        let opaque: AuthFailure = TokenError::BadAuthenticator.into();
        assert_eq!(opaque.to_string(), "authentication failed");
        assert_eq!(opaque, TokenError::MissingAuthenticator.into_opaque());
    }

    #[test]
    fn test_config_error_kind() {
        assert!(TokenError::Config("No HMAC key set".to_string()).is_config());
        assert!(!TokenError::BadAuthenticator.is_config());
    }
}
