//! DTOs for talking to the authentication backend

use serde::{Deserialize, Serialize};

use crate::{AccessToken, PasswordRef, RefreshToken, RefreshTokenRef, UsernameRef};

#[derive(Debug, Serialize)]
pub(super) struct RefreshRequest<'a> {
    pub refresh: &'a RefreshTokenRef,
}

#[derive(Debug, Deserialize)]
pub(super) struct RefreshResponse {
    pub access: AccessToken,
    #[serde(default)]
    pub refresh: Option<RefreshToken>,
}

#[derive(Debug, Serialize)]
pub(super) struct LoginRequest<'a> {
    pub username: &'a UsernameRef,
    pub password: &'a PasswordRef,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginResponse {
    pub access: AccessToken,
    pub refresh: RefreshToken,
}

/// The signed-in user as reported by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// The user's numeric identifier
    pub id: u64,
    /// The user's email address
    #[serde(default)]
    pub email: String,
    /// The user's login name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Given name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl SessionUser {
    /// The user's full name, trimmed, possibly empty
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_owned()
    }
}
