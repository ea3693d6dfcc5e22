//! Stream key authentication
//!
//! Key types:
//! - `live_` prefix: Publisher keys, presented on WHIP ingest
//! - `play_` prefix: Viewer keys, presented on WHEP playback
//!
//! Both are signed with one shared HMAC secret ([`HmacSecret`]) and carry no
//! expiry. Decoding failures are reported as [`TokenError`] for diagnostics;
//! anything shown to the remote party should go through [`AuthFailure`].

mod secret;
mod tokens;

pub use secret::{HmacSecret, HMAC_KEY_ENV};
pub use tokens::{
    redact_token, strip_bearer, AuthFailure, Role, StreamKeyCodec, TokenError, BEARER_PREFIX,
    WHEP_PREFIX, WHIP_PREFIX,
};
