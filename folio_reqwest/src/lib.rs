//! Token-aware dispatch of requests to the portfolio backend
//!
//! [`AccessTokenMiddleware`] sits in a
//! [`ClientWithMiddleware`](reqwest_middleware::ClientWithMiddleware) stack.
//! Before each outbound request it asks a [`TokenRefresher`] for a usable
//! access token, refreshing an expired one first, and attaches it as a
//! bearer token. If the refresh fails, the request is never sent.
//!
//! [`ApiClient`] wraps such a stack with a base URL and turns responses into
//! typed results: `401 Unauthorized` becomes
//! [`ApiError::AuthenticationFailed`], other failures carry their status and
//! body, and successful bodies are decoded from JSON.
//!
//! ```
//! use std::sync::Arc;
//! use folio_reqwest::{ApiClient, ApiRequest};
//! use folio_tokens::{exchange::RefreshExchange, session::InMemorySession, TokenRefresher};
//! use reqwest::Url;
//!
//! let base = Url::parse("http://localhost:8000/api/v1/auth/").unwrap();
//! let refresher = TokenRefresher::new(
//!     Arc::new(InMemorySession::new()),
//!     RefreshExchange::new(reqwest::Client::new(), base.join("token/refresh/").unwrap()),
//! );
//!
//! let api = ApiClient::authenticated(reqwest::Client::new(), base, refresher);
//! let request = ApiRequest::get("profile/");
//! # let _ = (api, request);
//! ```
//!
//! If a request already has an `Authorization` header by the time the
//! middleware runs, the existing value is left in place.

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

use std::fmt;

use bytes::{BufMut, BytesMut};
use folio_clock::{Clock, System};
use folio_tokens::{AccessTokenRef, TokenRefresher};
use predicates::{reflection, Predicate};
use reqwest::{header, Request, Response, Url};
use reqwest_middleware::{Middleware, Next, Result};

mod client;

pub use client::{ApiClient, ApiError, ApiRequest, RequestBody};

/// A middleware that attaches a usable access token to outgoing requests
#[derive(Clone, Debug)]
pub struct AccessTokenMiddleware<P, C = System> {
    refresher: TokenRefresher<C>,
    predicate: P,
}

impl<C> AccessTokenMiddleware<SameOrigin, C> {
    /// Construct a new middleware from a token refresher
    ///
    /// By default, the token is only attached to requests sent to the same
    /// origin as `api_base`. To change this behavior, provide a custom
    /// predicate with [`with_predicate()`][Self::with_predicate()].
    pub fn new(refresher: TokenRefresher<C>, api_base: &Url) -> Self {
        Self {
            refresher,
            predicate: SameOrigin::of(api_base),
        }
    }

    /// Replaces the default predicate with a custom predicate
    pub fn with_predicate<P>(self, predicate: P) -> AccessTokenMiddleware<P, C> {
        AccessTokenMiddleware {
            refresher: self.refresher,
            predicate,
        }
    }
}

fn bearer_header(
    token: &AccessTokenRef,
) -> std::result::Result<header::HeaderValue, header::InvalidHeaderValue> {
    let mut header_value = BytesMut::with_capacity(token.as_str().len() + 7);
    header_value.put_slice(b"Bearer ");
    header_value.put_slice(token.as_str().as_bytes());
    let mut value = header::HeaderValue::from_maybe_shared(header_value.freeze())?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait::async_trait]
impl<P, C> Middleware for AccessTokenMiddleware<P, C>
where
    P: Predicate<Request> + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if self.predicate.eval(&req) && !req.headers().contains_key(header::AUTHORIZATION) {
            match self.refresher.access_token().await {
                Ok(Some(token)) => {
                    let value =
                        bearer_header(&token).map_err(reqwest_middleware::Error::middleware)?;
                    req.headers_mut().insert(header::AUTHORIZATION, value);
                }
                Ok(None) => {
                    tracing::trace!(url = %req.url(), "no session tokens, sending without authorization");
                }
                Err(error) => {
                    tracing::warn!(
                        url = %req.url(),
                        %error,
                        "unable to obtain a usable access token, not sending request"
                    );
                    return Err(reqwest_middleware::Error::middleware(error));
                }
            }
        }

        next.run(req, extensions).await
    }
}

/// Only attach an access token if the request goes to the given origin
///
/// An origin is the scheme, host and port of a URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SameOrigin {
    scheme: String,
    host: Option<String>,
    port: Option<u16>,
}

impl SameOrigin {
    /// Construct a predicate matching the origin of `url`
    pub fn of(url: &Url) -> Self {
        Self {
            scheme: url.scheme().to_owned(),
            host: url.host_str().map(ToOwned::to_owned),
            port: url.port_or_known_default(),
        }
    }

    fn matches(&self, url: &Url) -> bool {
        url.scheme() == self.scheme
            && url.host_str() == self.host.as_deref()
            && url.port_or_known_default() == self.port
    }
}

impl Predicate<Request> for SameOrigin {
    #[inline]
    fn eval(&self, req: &Request) -> bool {
        self.matches(req.url())
    }

    fn find_case(&self, expected: bool, req: &Request) -> Option<reflection::Case> {
        let result = self.eval(req);
        if result != expected {
            let url = req.url();
            let origin = format!(
                "{}://{}:{}",
                url.scheme(),
                url.host_str().unwrap_or("<no host>"),
                url.port_or_known_default()
                    .map_or_else(|| "<no port>".to_owned(), |p| p.to_string())
            );
            Some(
                reflection::Case::new(Some(self), result)
                    .add_product(reflection::Product::new("origin", origin)),
            )
        } else {
            None
        }
    }
}

impl reflection::PredicateReflection for SameOrigin {}
impl fmt::Display for SameOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "origin == {}://{}",
            self.scheme,
            self.host.as_deref().unwrap_or("")
        )?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}
