use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where uploaded files live. Paths handed to a storage are relative
/// (`uploads/recipe/<uuid>.png`) and are what the database stores.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Writes `bytes` at `relative_path`, creating parent directories.
    async fn save(&self, relative_path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Removes the file. Deleting a missing file is not an error.
    async fn delete(&self, relative_path: &str) -> Result<(), StorageError>;

    /// Public URL the file is served under.
    fn url(&self, relative_path: &str) -> String;
}

/// Stores uploads below a root directory on the local filesystem.
pub struct FileSystemStorage {
    root: PathBuf,
    base_url: String,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolves a relative path under the root, rejecting anything that could escape it.
    pub fn resolve(&self, relative_path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(relative_path);
        let is_plain = !relative_path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(StorageError::InvalidPath(relative_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStorage for FileSystemStorage {
    async fn save(&self, relative_path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let full_path = self.resolve(relative_path)?;
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;
        debug!(path = %full_path.display(), size = bytes.len(), "Stored media file.");
        Ok(())
    }

    async fn delete(&self, relative_path: &str) -> Result<(), StorageError> {
        let full_path = self.resolve(relative_path)?;
        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn url(&self, relative_path: &str) -> String {
        format!("{}/{}", self.base_url, relative_path)
    }
}
