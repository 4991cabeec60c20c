//! Peeking at the expiration claim of an access token
//!
//! The token is never verified here. The signature belongs to the backend;
//! this module only reads the `exp` claim to decide whether sending the token
//! is pointless.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use folio_clock::{Clock, System, UnixTime};
use serde::Deserialize;
use thiserror::Error;

use crate::AccessTokenRef;

/// URL-safe alphabet that accepts payload segments with or without padding
const JWT_SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The only claim the client cares about
#[derive(Debug, Deserialize)]
struct ExpirationClaim {
    exp: UnixTime,
}

/// The access token could not be read as a compact JWT with an expiration claim
#[derive(Debug, Error)]
pub enum MalformedToken {
    /// The token did not have exactly three `.`-separated segments
    #[error("expected 3 token segments, found {0}")]
    SegmentCount(usize),
    /// The payload segment was not valid base64url
    #[error("token payload is not valid base64url")]
    Payload(#[from] base64::DecodeError),
    /// The payload did not contain a numeric `exp` claim
    #[error("token payload does not carry a valid expiration claim")]
    Claims(#[from] serde_json::Error),
}

impl AccessTokenRef {
    /// Reads the expiration time from the token's `exp` claim
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a compact JWT, if the payload
    /// is not base64url-encoded JSON, or if `exp` is missing or not a
    /// non-negative integer.
    pub fn expiry(&self) -> Result<UnixTime, MalformedToken> {
        let segments: Vec<&str> = self.as_str().split('.').collect();
        if segments.len() != 3 {
            return Err(MalformedToken::SegmentCount(segments.len()));
        }

        let payload = JWT_SEGMENT.decode(segments[1])?;
        let claims: ExpirationClaim = serde_json::from_slice(&payload)?;
        Ok(claims.exp)
    }

    /// Whether the token should be considered expired at `now`
    ///
    /// A token that cannot be decoded is always reported as expired.
    pub fn is_expired_at(&self, now: UnixTime) -> bool {
        match self.expiry() {
            Ok(exp) => {
                let expired = now >= exp;
                tracing::trace!(exp = exp.0, now = now.0, expired, "checked token expiry");
                expired
            }
            Err(error) => {
                tracing::warn!(
                    error = (&error as &dyn std::error::Error),
                    "unable to read token expiry, treating token as expired"
                );
                true
            }
        }
    }

    /// Whether the token should be considered expired according to `clock`
    #[inline]
    pub fn is_expired_with_clock<C: Clock>(&self, clock: &C) -> bool {
        self.is_expired_at(clock.now())
    }

    /// Whether the token should be considered expired right now
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_clock(&System)
    }
}
