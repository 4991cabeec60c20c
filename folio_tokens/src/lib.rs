//! Access token lifecycle for clients of the portfolio backend
//!
//! A signed-in client holds a [`TokenPair`]: a short-lived access token that
//! is attached to API calls and a longer-lived refresh token that is only ever
//! sent to the backend's refresh endpoint. This crate decides when the access
//! token is no longer usable and trades the refresh token for a new one.
//!
//! # General flow
//!
//! Sign in once with a [`LoginExchange`][exchange::LoginExchange] and store the
//! issued pair in a [`SessionStore`][session::SessionStore]. From then on, ask a
//! [`TokenRefresher`] for the access token before each call. The refresher
//! reads the `exp` claim of the stored access token and, if it has passed,
//! performs a single refresh exchange, stores the new pair and hands back its
//! access token.
//!
//! ```
//! use std::sync::Arc;
//! use folio_tokens::{exchange::RefreshExchange, session::InMemorySession, TokenRefresher};
//!
//! # #[tokio::main(flavor = "current_thread")] async fn main() {
//! let exchange = RefreshExchange::new(
//!     reqwest::Client::new(),
//!     reqwest::Url::parse("http://localhost:8000/api/v1/auth/token/refresh/").unwrap(),
//! );
//! let refresher = TokenRefresher::new(Arc::new(InMemorySession::new()), exchange);
//!
//! // Nobody has signed in yet, so there is nothing to attach.
//! assert!(refresher.access_token().await.unwrap().is_none());
//! # }
//! ```
//!
//! A token whose expiration cannot be read is treated as expired, so a
//! refresh is attempted rather than sending a token the backend will reject.
//!
//! # Features
//!
//! * `file` (default): [`FileSession`][session::FileSession], a session
//!   persisted to the local filesystem.
//! * `test-util`: the [`testing`] module for building unsigned tokens.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod braids;
pub mod claims;
pub mod exchange;
mod refresher;
pub mod session;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
mod tokens;

pub use braids::*;
pub use refresher::{SharedRefreshError, TokenRefresher};
pub use tokens::TokenPair;
