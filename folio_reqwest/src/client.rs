use std::fmt;

use folio_clock::Clock;
use folio_tokens::{exchange::RefreshError, SharedRefreshError, TokenRefresher};
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    multipart::Form,
    Method, StatusCode, Url,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::AccessTokenMiddleware;

/// A failed call to the backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// The access token was expired and the session has no refresh token
    #[error("access token expired and no refresh credential is available")]
    NoRefreshCredential,
    /// The access token was expired and could not be refreshed
    ///
    /// The resource request was not sent.
    #[error("access token expired and could not be refreshed")]
    RefreshFailed(#[source] SharedRefreshError),
    /// The backend answered `401 Unauthorized`
    #[error("authentication failed: {body}")]
    AuthenticationFailed {
        /// The body of the error response
        body: String,
    },
    /// The backend answered with some other non-success status
    #[error("HTTP error {status}: {body}")]
    Http {
        /// The status returned by the backend
        status: StatusCode,
        /// The body of the error response
        body: String,
    },
    /// The request could not be sent or no response was received
    #[error("error sending request")]
    Transport(#[source] reqwest_middleware::Error),
    /// The response body could not be read
    #[error("error reading response body")]
    BodyRead(#[source] reqwest::Error),
    /// The response body was not the expected JSON
    #[error("error decoding response body")]
    Decode(#[from] serde_json::Error),
    /// The request path could not be resolved against the base URL
    #[error("invalid request path {path:?}")]
    InvalidPath {
        /// The offending path
        path: String,
        /// Why it could not be resolved
        #[source]
        source: url::ParseError,
    },
}

impl ApiError {
    /// The HTTP status the backend answered with, if it answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::AuthenticationFailed { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the only way forward is to sign in again
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            Self::NoRefreshCredential | Self::RefreshFailed(_) | Self::AuthenticationFailed { .. }
        )
    }

    fn from_transport(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Middleware(err) => {
                match err.downcast::<SharedRefreshError>() {
                    Ok(refresh) if matches!(*refresh, RefreshError::NoRefreshCredential) => {
                        Self::NoRefreshCredential
                    }
                    Ok(refresh) => Self::RefreshFailed(refresh),
                    Err(err) => Self::Transport(reqwest_middleware::Error::Middleware(err)),
                }
            }
            err => Self::Transport(err),
        }
    }
}

/// The body of an [`ApiRequest`]
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// A JSON document
    Json(serde_json::Value),
    /// A multipart form, such as a file upload
    ///
    /// The content type (with its boundary) is left to the form.
    Multipart(Form),
}

/// A single call to the backend
#[derive(Debug)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: RequestBody,
}

impl ApiRequest {
    /// A request for `path`, relative to the client's base URL
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// A `GET` request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// A `POST` request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// A `DELETE` request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Sets a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, serde_json::Error> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Sets a multipart body
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Adds a header, replacing any default the client would set
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// The request method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request path
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Dispatches [`ApiRequest`]s to a backend rooted at a base URL
#[derive(Clone)]
pub struct ApiClient {
    client: ClientWithMiddleware,
    base_url: Url,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Wraps an existing middleware stack
    ///
    /// A trailing slash is added to `base_url` if missing so that request
    /// paths extend it rather than replace its last segment.
    pub fn new(client: ClientWithMiddleware, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    /// A client that never attaches credentials
    pub fn public(client: reqwest::Client, base_url: Url) -> Self {
        Self::new(ClientBuilder::new(client).build(), base_url)
    }

    /// A client that attaches the session's access token to requests for
    /// the base URL's origin
    pub fn authenticated<C>(client: reqwest::Client, base_url: Url, refresher: TokenRefresher<C>) -> Self
    where
        C: Clock + Send + Sync + 'static,
    {
        let middleware = AccessTokenMiddleware::new(refresher, &base_url);
        Self::new(ClientBuilder::new(client).with(middleware).build(), base_url)
    }

    /// The URL that request paths are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a request path against the base URL
    ///
    /// A leading `/` is ignored, so `"/profile/"` and `"profile/"` name the
    /// same resource.
    pub fn url_for(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ApiError::InvalidPath {
                path: path.to_owned(),
                source,
            })
    }

    /// Sends a request, decoding a successful JSON response into `T`
    ///
    /// An empty success body decodes as JSON `null`, so `()` and `Option<_>`
    /// can be used for endpoints that answer `204 No Content`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`]. At most one refresh is attempted before the request
    /// is sent, and none after a `401`.
    #[tracing::instrument(
        err,
        skip(self, request),
        fields(method = %request.method, path = %request.path),
    )]
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let ApiRequest {
            method,
            path,
            query,
            headers,
            body,
        } = request;

        let mut url = self.url_for(&path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(&query);
        }

        let builder = self.client.request(method, url);
        let builder = match body {
            RequestBody::Empty => builder.header(header::CONTENT_TYPE, "application/json"),
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };
        let builder = if headers.is_empty() {
            builder
        } else {
            builder.headers(headers)
        };

        let resp = builder.send().await.map_err(ApiError::from_transport)?;

        let status = resp.status();
        tracing::debug!(response.status = status.as_u16(), "received response");

        if status == StatusCode::UNAUTHORIZED {
            let body = resp.text().await.map_err(ApiError::BodyRead)?;
            return Err(ApiError::AuthenticationFailed { body });
        }

        if !status.is_success() {
            let body = resp.text().await.map_err(ApiError::BodyRead)?;
            return Err(ApiError::Http { status, body });
        }

        let body = resp.bytes().await.map_err(ApiError::BodyRead)?;
        if body.is_empty() {
            Ok(serde_json::from_slice(b"null")?)
        } else {
            Ok(serde_json::from_slice(&body)?)
        }
    }

    /// Sends a `GET` request for `path`
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await
    }

    /// Sends a `POST` request for `path` with a JSON body
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    /// Sends a `POST` request for `path` with a multipart body
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        self.send(ApiRequest::post(path).multipart(form)).await
    }

    /// Sends a `DELETE` request for `path`
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::delete(path)).await
    }
}
