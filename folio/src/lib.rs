//! A command-line and library client for the portfolio backend
//!
//! [`Portfolio`] wraps two dispatchers: one for the public site resources
//! (about, projects, blog, contact) and one for the signed-in user's profile
//! resources, which attaches the session's access token and refreshes it
//! before a request once it has expired.
//!
//! ```no_run
//! use std::sync::Arc;
//! use folio::{FolioConfig, Portfolio};
//! use folio_tokens::session::FileSession;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FolioConfig::default();
//! let session = Arc::new(FileSession::new(config.session_file()));
//! let portfolio = Portfolio::new(&config, session)?;
//!
//! for skill in portfolio.skills().await? {
//!     println!("{} ({}%)", skill.name, skill.level);
//! }
//! # Ok(())
//! # }
//! ```

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

mod config;
pub mod model;
mod portfolio;

pub use config::{
    FolioConfig, InvalidBaseUrl, DEFAULT_API_BASE_URL, DEFAULT_AUTH_BASE_URL,
    DEFAULT_SESSION_FILE,
};
pub use folio_reqwest::{ApiClient, ApiError, ApiRequest};
pub use portfolio::{Portfolio, SignInError};
