//! Filesystem access.
//!
//! murmur touches the filesystem in three places: reading the config file,
//! checking for the speech model directory, and checking for the pairing
//! credential. [`FileSystem`] covers exactly those.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Filesystem operations used by murmur.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Read a file's entire contents as a UTF-8 string.
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// True if `path` exists, file or directory.
    async fn exists(&self, path: &Path) -> bool;

    /// True if `path` exists and is a directory.
    async fn is_dir(&self, path: &Path) -> bool;

    fn home_dir(&self) -> Option<PathBuf>;
}

/// [`FileSystem`] over [`tokio::fs`].
pub struct NativeFileSystem;

#[async_trait]
impl FileSystem for NativeFileSystem {
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_dir(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}
