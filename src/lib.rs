//! Streamkey - signed stream keys for WHIP publishing and WHEP playback
//!
//! Turns a plain stream identifier into a role-scoped HMAC credential and
//! verifies presented credentials back into the identifier.

pub mod auth;
pub mod config;
pub mod keygen;

pub use auth::{AuthFailure, HmacSecret, Role, StreamKeyCodec, TokenError};
pub use config::AppEnv;
