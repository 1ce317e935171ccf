//! Uploaded file storage.
//!
//! Donations and announcements keep a JSON array of storage keys. The panel
//! never uploads; it resolves keys to URLs and removes files when the owning
//! row is deleted.

use std::path::{Component, Path, PathBuf};

use crate::{AppError, AppResult, config::StorageSettings};

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Delete a file. Missing files are not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Delete every key, returning how many deletions failed.
    async fn delete_all(&self, keys: &[String]) -> usize {
        let mut failed = 0;
        for key in keys {
            if let Err(e) = self.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to delete stored file");
                failed += 1;
            }
        }
        failed
    }
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self { base_path, base_url }
    }

    /// Create a backend from configuration.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(settings.base_path.clone(), settings.base_url.clone())
    }

    /// Resolve a key below the base path.
    ///
    /// Leading slashes and `./` are ignored; keys that climb out of the
    /// base directory are rejected.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        let mut path = self.base_path.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(AppError::BadRequest(format!("Invalid storage key: {key}")));
                }
            }
        }
        Ok(path)
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!("Failed to delete file: {e}"))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.resolve(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to stat file: {e}")))
    }
}
