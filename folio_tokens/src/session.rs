//! Stores for the signed-in session's token pair
//!
//! A session holds at most one [`TokenPair`]. Having none means the client is
//! unauthenticated. Signing in stores a pair, a refresh replaces it, and
//! signing out clears it.

use std::{error, sync::RwLock};

use async_trait::async_trait;

use crate::TokenPair;

#[cfg(feature = "file")]
mod file;

#[cfg(feature = "file")]
#[cfg_attr(docsrs, doc(cfg(feature = "file")))]
pub use file::FileSession;

/// An error raised by a session store
pub type SessionError = Box<dyn error::Error + Send + Sync + 'static>;

/// Read and write access to the current session's tokens
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Gets the current token pair, or `None` if no one is signed in
    async fn current(&self) -> Result<Option<TokenPair>, SessionError>;

    /// Replaces the current token pair
    ///
    /// Passing `None` signs the session out.
    async fn replace(&self, tokens: Option<TokenPair>) -> Result<(), SessionError>;
}

/// A session that lives only as long as the process
#[derive(Debug, Default)]
pub struct InMemorySession {
    tokens: RwLock<Option<TokenPair>>,
}

impl InMemorySession {
    /// Constructs a signed-out session
    pub const fn new() -> Self {
        Self {
            tokens: RwLock::new(None),
        }
    }

    /// Constructs a session that is already signed in with `tokens`
    pub fn signed_in(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySession {
    async fn current(&self) -> Result<Option<TokenPair>, SessionError> {
        let guard = self
            .tokens
            .read()
            .map_err(|_| "in-memory session lock poisoned")?;
        Ok(guard.clone())
    }

    async fn replace(&self, tokens: Option<TokenPair>) -> Result<(), SessionError> {
        let mut guard = self
            .tokens
            .write()
            .map_err(|_| "in-memory session lock poisoned")?;
        *guard = tokens;
        Ok(())
    }
}
