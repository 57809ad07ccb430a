//! Storage abstraction over the upload tree.
//!
//! All engine paths are relative to the storage root; `resolve` yields
//! the absolute path for collaborators (the codec) that read the
//! filesystem directly.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{ConvertError, Result};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    /// Absolute path for a root-relative locator.
    fn resolve(&self, rel: &str) -> PathBuf;

    async fn exists(&self, rel: &str) -> bool;
    async fn read(&self, rel: &str) -> Result<Vec<u8>>;
    async fn write(&self, rel: &str, bytes: &[u8]) -> Result<()>;
    async fn delete(&self, rel: &str) -> Result<()>;
    async fn rename(&self, from: &str, to: &str) -> Result<()>;
}

/// Local-filesystem storage rooted at the configured upload directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        // Absolute roots keep resolved paths stable regardless of the
        // process working directory.
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(root)
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn resolve(&self, rel: &str) -> PathBuf {
        self.root.join(rel.trim_start_matches('/'))
    }

    async fn exists(&self, rel: &str) -> bool {
        fs::try_exists(self.resolve(rel)).await.unwrap_or(false)
    }

    async fn read(&self, rel: &str) -> Result<Vec<u8>> {
        fs::read(self.resolve(rel)).await.map_err(ConvertError::Io)
    }

    async fn write(&self, rel: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(ConvertError::Io)?;
        }
        fs::write(path, bytes).await.map_err(ConvertError::Io)
    }

    async fn delete(&self, rel: &str) -> Result<()> {
        fs::remove_file(self.resolve(rel))
            .await
            .map_err(ConvertError::Io)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(self.resolve(from), self.resolve(to))
            .await
            .map_err(ConvertError::Io)
    }
}
