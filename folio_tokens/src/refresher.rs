use std::{fmt, sync::Arc};

use folio_clock::{Clock, System};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use crate::{
    exchange::{RefreshError, RefreshExchange},
    session::SessionStore,
    AccessToken, TokenPair,
};

/// A refresh failure, shared by every caller that was waiting on the refresh
pub type SharedRefreshError = Arc<RefreshError>;

type PendingRefresh = Shared<BoxFuture<'static, Result<TokenPair, SharedRefreshError>>>;

/// Hands out usable access tokens from a session, refreshing them when expired
///
/// Only one refresh is in flight at a time. Callers that find the token
/// expired while a refresh is already running wait on that refresh and share
/// its outcome rather than starting their own.
pub struct TokenRefresher<C = System> {
    inner: Arc<Inner<C>>,
}

struct Inner<C> {
    session: Arc<dyn SessionStore>,
    exchange: RefreshExchange,
    clock: C,
    pending: Mutex<Option<PendingRefresh>>,
}

impl<C> Clone for TokenRefresher<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for TokenRefresher<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("exchange", &self.inner.exchange)
            .field("clock", &self.inner.clock)
            .finish_non_exhaustive()
    }
}

impl TokenRefresher<System> {
    /// Constructs a refresher that checks expiry against the system clock
    pub fn new(session: Arc<dyn SessionStore>, exchange: RefreshExchange) -> Self {
        Self::with_clock(session, exchange, System)
    }
}

impl<C> TokenRefresher<C> {
    /// Constructs a refresher that checks expiry against `clock`
    pub fn with_clock(session: Arc<dyn SessionStore>, exchange: RefreshExchange, clock: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                session,
                exchange,
                clock,
                pending: Mutex::new(None),
            }),
        }
    }

    /// The session this refresher reads from and writes to
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.inner.session
    }
}

impl<C: Clock + Send + Sync> TokenRefresher<C> {
    /// Gets an access token that is not known to be expired
    ///
    /// Returns `Ok(None)` when no one is signed in. An expired token is
    /// refreshed, and the new pair is stored in the session before it is
    /// returned.
    ///
    /// # Errors
    ///
    /// Fails if the session cannot be read or if the refresh fails. A known
    /// expired token is never returned.
    pub async fn access_token(&self) -> Result<Option<AccessToken>, SharedRefreshError> {
        match self.session_tokens().await? {
            None => {
                tracing::trace!("no session tokens, continuing unauthenticated");
                Ok(None)
            }
            Some(tokens) if !tokens.is_expired_with_clock(&self.inner.clock) => {
                Ok(Some(tokens.access_token().to_owned()))
            }
            Some(_) => {
                tracing::debug!("access token expired, refreshing");
                let tokens = self.refresh(false).await?;
                Ok(tokens.map(|t| t.access_token().to_owned()))
            }
        }
    }

    /// Refreshes the session's tokens even if the access token is still valid
    ///
    /// Returns `Ok(None)` when no one is signed in.
    pub async fn refresh_now(&self) -> Result<Option<TokenPair>, SharedRefreshError> {
        self.refresh(true).await
    }

    async fn session_tokens(&self) -> Result<Option<TokenPair>, SharedRefreshError> {
        self.inner
            .session
            .current()
            .await
            .map_err(|e| Arc::new(RefreshError::Session(e)))
    }

    async fn refresh(&self, force: bool) -> Result<Option<TokenPair>, SharedRefreshError> {
        let pending = {
            let mut slot = self.inner.pending.lock().await;
            // A settled refresh left behind by cancelled callers is stale.
            if slot.as_ref().map_or(false, |p| p.peek().is_some()) {
                tracing::trace!("discarding settled refresh");
                *slot = None;
            }
            match &*slot {
                Some(pending) => {
                    tracing::trace!("joining refresh already in flight");
                    pending.clone()
                }
                None => {
                    // Another caller may have finished a refresh since we last looked.
                    let latest = match self.session_tokens().await? {
                        None => return Ok(None),
                        Some(latest) => latest,
                    };
                    if !force && !latest.is_expired_with_clock(&self.inner.clock) {
                        return Ok(Some(latest));
                    }

                    let pending = self.start_refresh(latest);
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;

        let mut slot = self.inner.pending.lock().await;
        if slot.as_ref().map_or(false, |p| p.ptr_eq(&pending)) {
            *slot = None;
        }

        result.map(Some)
    }

    fn start_refresh(&self, current: TokenPair) -> PendingRefresh {
        let session = Arc::clone(&self.inner.session);
        let exchange = self.inner.exchange.clone();

        async move {
            let tokens = exchange.refresh(&current).await?;
            session
                .replace(Some(tokens.clone()))
                .await
                .map_err(RefreshError::Session)?;
            Ok::<_, RefreshError>(tokens)
        }
        .map(|result| result.map_err(Arc::new))
        .boxed()
        .shared()
    }
}
