use std::{path::PathBuf, time::Duration};

use reqwest::Url;
use thiserror::Error;

/// The default base URL for public resources
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/";

/// The default base URL for authentication and profile resources
pub const DEFAULT_AUTH_BASE_URL: &str = "http://localhost:8000/api/v1/auth/";

/// The default location of the persisted session
pub const DEFAULT_SESSION_FILE: &str = ".folio-session.json";

/// A base URL that cannot have paths joined onto it
#[derive(Debug, Error)]
#[error("{url} cannot be used as a base URL")]
pub struct InvalidBaseUrl {
    url: Url,
}

/// Where the backend lives and how to talk to it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolioConfig {
    api_base_url: Url,
    auth_base_url: Url,
    session_file: PathBuf,
    timeout: Option<Duration>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default API base URL is valid"),
            auth_base_url: Url::parse(DEFAULT_AUTH_BASE_URL)
                .expect("default auth base URL is valid"),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            timeout: None,
        }
    }
}

impl FolioConfig {
    /// Constructs a configuration for the given base URLs
    ///
    /// Both URLs gain a trailing slash if they lack one, so that relative
    /// paths extend them instead of replacing their last segment.
    pub fn new(api_base_url: Url, auth_base_url: Url) -> Result<Self, InvalidBaseUrl> {
        Ok(Self {
            api_base_url: normalize_base(api_base_url)?,
            auth_base_url: normalize_base(auth_base_url)?,
            ..Self::default()
        })
    }

    /// Sets where the session is persisted
    pub fn with_session_file(mut self, session_file: impl Into<PathBuf>) -> Self {
        self.session_file = session_file.into();
        self
    }

    /// Sets a timeout applied to every HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The base URL for public resources
    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    /// The base URL for authentication and profile resources
    pub fn auth_base_url(&self) -> &Url {
        &self.auth_base_url
    }

    /// Where the session is persisted
    pub fn session_file(&self) -> &PathBuf {
        &self.session_file
    }

    /// The per-request timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The endpoint that trades a refresh token for a new access token
    pub fn refresh_url(&self) -> Url {
        self.auth_endpoint("token/refresh/")
    }

    /// The endpoint that trades credentials for a token pair
    pub fn login_url(&self) -> Url {
        self.auth_endpoint("login/")
    }

    /// The endpoint that describes the signed-in user
    pub fn me_url(&self) -> Url {
        self.auth_endpoint("me/")
    }

    /// Builds an HTTP client honoring the configured timeout
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    fn auth_endpoint(&self, path: &str) -> Url {
        let mut url = self.auth_base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path.split('/'));
        }
        url
    }
}

fn normalize_base(mut url: Url) -> Result<Url, InvalidBaseUrl> {
    if url.cannot_be_a_base() {
        return Err(InvalidBaseUrl { url });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
