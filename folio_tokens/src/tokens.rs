use folio_clock::{Clock, System, UnixTime};
use serde::{Deserialize, Serialize};

use crate::{AccessToken, AccessTokenRef, RefreshToken, RefreshTokenRef};

/// The access and refresh tokens held by a signed-in session
///
/// A pair is never edited in place. A refresh produces a new pair that
/// replaces the old one wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    access_token: AccessToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<RefreshToken>,
}

impl TokenPair {
    /// Constructs a token pair
    pub fn new(access_token: AccessToken, refresh_token: Option<RefreshToken>) -> Self {
        Self {
            access_token,
            refresh_token,
        }
    }

    /// Gets the current access token
    #[inline]
    pub fn access_token(&self) -> &AccessTokenRef {
        &self.access_token
    }

    /// Gets the refresh token, if the session has one
    #[inline]
    pub fn refresh_token(&self) -> Option<&RefreshTokenRef> {
        self.refresh_token.as_deref()
    }

    /// The expiration time encoded in the access token, if it can be read
    pub fn expires_at(&self) -> Option<UnixTime> {
        self.access_token.expiry().ok()
    }

    /// Whether the access token is expired at `now`
    #[inline]
    pub fn is_expired_at(&self, now: UnixTime) -> bool {
        self.access_token.is_expired_at(now)
    }

    /// Whether the access token is expired according to `clock`
    #[inline]
    pub fn is_expired_with_clock<C: Clock>(&self, clock: &C) -> bool {
        self.is_expired_at(clock.now())
    }

    /// Whether the access token is expired right now
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_clock(&System)
    }

    /// Produces the pair that follows a successful refresh
    ///
    /// The refresh token is carried forward unless the authority rotated it.
    pub fn refreshed(&self, access_token: AccessToken, rotated: Option<RefreshToken>) -> Self {
        Self {
            access_token,
            refresh_token: rotated.or_else(|| self.refresh_token.clone()),
        }
    }
}
