//! Bearer token for the dashboard backend.
//!
//! The token lives in a single plain-text file (`token_path` in
//! `config/main.toml`) and is the only state that survives a restart. The
//! HTTP gateway reads it for every request and calls [`Session::clear`] when
//! the backend answers 401, which is the equivalent of being logged out.

use crate::errors::SessionError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub struct Session {
    token_path: PathBuf,
    token: RwLock<Option<String>>,
}

impl Session {
    /// Load the token file. A missing file yields an anonymous session.
    pub async fn load(token_path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let token_path = token_path.as_ref().to_path_buf();

        let token = match fs::read_to_string(&token_path).await {
            Ok(content) => {
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("No session token at {:?}, requests will be anonymous", token_path);
                None
            }
            Err(e) => {
                return Err(SessionError::ReadFailed {
                    path: token_path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        Ok(Self {
            token_path,
            token: RwLock::new(token),
        })
    }

    /// In-memory session that never touches the disk until `store` is called.
    pub fn with_token(token_path: impl AsRef<Path>, token: Option<String>) -> Self {
        Self {
            token_path: token_path.as_ref().to_path_buf(),
            token: RwLock::new(token),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    #[inline]
    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub async fn store(&self, token: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| self.write_failed(e))?;
            }
        }
        fs::write(&self.token_path, token).await.map_err(|e| self.write_failed(e))?;

        *self.token.write().await = Some(token.to_string());
        info!("Session token stored at {:?}", self.token_path);
        Ok(())
    }

    /// Forget the token in memory and on disk.
    pub async fn clear(&self) -> Result<(), SessionError> {
        let had_token = self.token.write().await.take().is_some();

        match fs::remove_file(&self.token_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.write_failed(e)),
        }

        if had_token {
            warn!("Session cleared, a new login is required");
        }
        Ok(())
    }

    fn write_failed(&self, e: std::io::Error) -> SessionError {
        SessionError::WriteFailed {
            path: self.token_path.display().to_string(),
            reason: e.to_string(),
        }
    }
}
