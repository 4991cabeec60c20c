//! Helpers for constructing tokens in tests
//!
//! Tokens built here carry a throwaway signature. They are only good for
//! exercising expiry decisions, never for talking to a real backend.

use base64::Engine;
use folio_clock::{Clock, DurationSecs, System, UnixTime};

use crate::{AccessToken, RefreshToken, TokenPair};

/// Encodes a segment the way compact JWTs do (base64url, no padding)
pub fn encode_segment(raw: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw)
}

/// Builds an unsigned compact JWT whose `exp` claim is `exp`
pub fn unsigned_jwt(exp: UnixTime) -> AccessToken {
    AccessToken::new(format!(
        "{}.{}.{}",
        encode_segment(br#"{"alg":"HS256","typ":"JWT"}"#),
        encode_segment(format!(r#"{{"token_type":"access","exp":{}}}"#, exp.0).as_bytes()),
        encode_segment(b"not-a-real-signature"),
    ))
}

/// An access token that expired an hour ago
pub fn expired_access_token() -> AccessToken {
    unsigned_jwt(System.now() - DurationSecs(3_600))
}

/// An access token that stays valid for another hour
pub fn fresh_access_token() -> AccessToken {
    unsigned_jwt(System.now() + DurationSecs(3_600))
}

/// A token pair with the given access token and a static refresh token
pub fn pair_with(access_token: AccessToken) -> TokenPair {
    TokenPair::new(access_token, Some(RefreshToken::from_static("test-refresh-token")))
}
