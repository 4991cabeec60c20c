use std::{io, path::PathBuf};

use async_trait::async_trait;
use tokio::{fs::OpenOptions, sync::RwLock};

use super::{SessionError, SessionStore};
use crate::TokenPair;

/// A session persisted to a local file
///
/// A missing file reads as a signed-out session. Signing out removes the file.
///
/// New tokens are written to a sibling staging file and renamed into place,
/// so a reader never observes a partially written session.
#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileSession {
    /// Constructs a new file session
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(ToOwned::to_owned)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_tokens(&self) -> Result<Option<TokenPair>, io::Error> {
        use tokio::io::AsyncReadExt;

        let mut file = match OpenOptions::new().read(true).open(&self.path).await {
            Ok(file) => file,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error),
        };
        let mut data = String::new();
        file.read_to_string(&mut data).await?;
        let tokens = serde_json::from_str(&data)?;
        Ok(Some(tokens))
    }

    async fn write_tokens(&self, tokens: &TokenPair) -> Result<(), io::Error> {
        use tokio::io::AsyncWriteExt;

        let mut file_opts = OpenOptions::new();

        file_opts.create(true).truncate(true).write(true);

        #[cfg(unix)]
        file_opts.mode(0o600);

        let staging = self.staging_path();
        let mut file = file_opts.open(&staging).await?;
        let data = serde_json::to_string_pretty(tokens)?;
        file.write_all(data.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&staging, &self.path).await
    }

    async fn remove_tokens(&self) -> Result<(), io::Error> {
        match tokio::fs::remove_file(&self.path).await {
            Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SessionStore for FileSession {
    async fn current(&self) -> Result<Option<TokenPair>, SessionError> {
        let _guard = self.lock.read().await;
        Ok(self.read_tokens().await?)
    }

    async fn replace(&self, tokens: Option<TokenPair>) -> Result<(), SessionError> {
        let _guard = self.lock.write().await;
        match tokens {
            Some(tokens) => {
                self.write_tokens(&tokens).await?;
                tracing::debug!(path = %self.path.display(), "persisted session tokens");
            }
            None => {
                self.remove_tokens().await?;
                tracing::debug!(path = %self.path.display(), "cleared session tokens");
            }
        }
        Ok(())
    }
}
