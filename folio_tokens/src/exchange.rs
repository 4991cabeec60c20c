//! Token exchanges against the authentication backend
//!
//! Two exchanges are supported: trading a refresh token for a new access
//! token, and trading a username and password for a fresh token pair. Neither
//! exchange persists anything; callers decide where the resulting tokens live.

use reqwest::{header, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{AccessTokenRef, PasswordRef, TokenPair, UsernameRef};

pub mod dto;

pub use dto::SessionUser;

/// An error while exchanging a refresh token for a new access token
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The session has no refresh token, so no exchange was attempted
    #[error("no refresh credential available")]
    NoRefreshCredential,
    /// The authority refused the refresh token
    #[error("token refresh rejected with status {status}: {body}")]
    Rejected {
        /// The status returned by the authority
        status: StatusCode,
        /// The body of the error response
        body: String,
    },
    /// Unable to deserialize the token body
    #[error("error deserializing refreshed token body")]
    TokenBody(#[from] serde_json::Error),
    /// Unable to read the response
    #[error("error reading refresh response body")]
    BodyRead(#[source] reqwest::Error),
    /// Unable to send the refresh request to the authority
    #[error("error sending refresh request to authority")]
    RequestSend(#[source] reqwest::Error),
    /// The session store could not be read or updated
    #[error("session store failed")]
    Session(#[source] crate::session::SessionError),
}

/// An error while signing in with a username and password
#[derive(Debug, Error)]
pub enum LoginError {
    /// The authority refused the credentials
    #[error("sign-in rejected with status {status}: {body}")]
    Rejected {
        /// The status returned by the authority
        status: StatusCode,
        /// The body of the error response
        body: String,
    },
    /// Tokens were issued, but the current user could not be fetched with them
    #[error("unable to load signed-in user, status {status}: {body}")]
    Profile {
        /// The status returned by the backend
        status: StatusCode,
        /// The body of the error response
        body: String,
    },
    /// Unable to deserialize a response body
    #[error("error deserializing sign-in response body")]
    Body(#[from] serde_json::Error),
    /// Unable to read a response
    #[error("error reading sign-in response body")]
    BodyRead(#[source] reqwest::Error),
    /// Unable to send a request to the authority
    #[error("error sending sign-in request to authority")]
    RequestSend(#[source] reqwest::Error),
}

/// Exchanges refresh tokens for new access tokens
#[derive(Clone, Debug)]
pub struct RefreshExchange {
    client: reqwest::Client,
    refresh_url: Url,
}

impl RefreshExchange {
    /// Constructs a new refresh exchange that posts to `refresh_url`
    pub fn new(client: reqwest::Client, refresh_url: Url) -> Self {
        Self {
            client,
            refresh_url,
        }
    }

    /// The endpoint refresh requests are sent to
    pub fn refresh_url(&self) -> &Url {
        &self.refresh_url
    }

    /// Obtains a new token pair from the refresh token in `current`
    ///
    /// # Errors
    ///
    /// Fails without any network I/O if `current` has no refresh token.
    /// Any transport failure or non-success status is a terminal failure.
    #[tracing::instrument(
        err,
        skip(self, current),
        fields(refresh_url = %self.refresh_url),
    )]
    pub async fn refresh(&self, current: &TokenPair) -> Result<TokenPair, RefreshError> {
        let refresh_token = current
            .refresh_token()
            .filter(|t| !t.as_str().is_empty())
            .ok_or(RefreshError::NoRefreshCredential)?;

        tracing::trace!("requesting refreshed access token");

        let resp = self
            .client
            .post(self.refresh_url.clone())
            .json(&dto::RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await
            .map_err(RefreshError::RequestSend)?;

        let status = resp.status();
        tracing::debug!(
            response.status = status.as_u16(),
            "received refresh response from authority"
        );

        if !status.is_success() {
            let body = resp.text().await.map_err(RefreshError::BodyRead)?;
            return Err(RefreshError::Rejected { status, body });
        }

        let body = resp.bytes().await.map_err(RefreshError::BodyRead)?;
        let resp: dto::RefreshResponse = serde_json::from_slice(&body)?;

        let rotated = resp.refresh.is_some();
        let tokens = current.refreshed(resp.access, resp.refresh);

        tracing::info!(
            rotated_refresh_token = rotated,
            expiry = tokens.expires_at().map(|e| e.0),
            "received refreshed access token"
        );

        Ok(tokens)
    }
}

/// The outcome of a successful sign-in
#[derive(Clone, Debug)]
pub struct SignedIn {
    /// The freshly issued token pair
    pub tokens: TokenPair,
    /// The user the tokens were issued to
    pub user: SessionUser,
}

/// Trades a username and password for a token pair
#[derive(Clone, Debug)]
pub struct LoginExchange {
    client: reqwest::Client,
    login_url: Url,
    me_url: Url,
}

impl LoginExchange {
    /// Constructs a new login exchange
    ///
    /// Credentials are posted to `login_url`; the issued access token is then
    /// used to load the signed-in user from `me_url`.
    pub fn new(client: reqwest::Client, login_url: Url, me_url: Url) -> Self {
        Self {
            client,
            login_url,
            me_url,
        }
    }

    /// Signs in, returning the issued tokens and the user they belong to
    #[tracing::instrument(
        err,
        skip(self, username, password),
        fields(login_url = %self.login_url, %username),
    )]
    pub async fn sign_in(
        &self,
        username: &UsernameRef,
        password: &PasswordRef,
    ) -> Result<SignedIn, LoginError> {
        let resp = self
            .client
            .post(self.login_url.clone())
            .json(&dto::LoginRequest { username, password })
            .send()
            .await
            .map_err(LoginError::RequestSend)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.map_err(LoginError::BodyRead)?;
            return Err(LoginError::Rejected { status, body });
        }

        let issued: dto::LoginResponse = read_json(resp).await?;
        let tokens = TokenPair::new(issued.access, Some(issued.refresh));

        let user = self.current_user(tokens.access_token()).await?;

        tracing::info!(user.id = user.id, "signed in");

        Ok(SignedIn { tokens, user })
    }

    async fn current_user(&self, access_token: &AccessTokenRef) -> Result<SessionUser, LoginError> {
        let resp = self
            .client
            .get(self.me_url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(access_token.as_str())
            .send()
            .await
            .map_err(LoginError::RequestSend)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.map_err(LoginError::BodyRead)?;
            return Err(LoginError::Profile { status, body });
        }

        read_json(resp).await
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, LoginError> {
    let body = resp.bytes().await.map_err(LoginError::BodyRead)?;
    Ok(serde_json::from_slice(&body)?)
}
