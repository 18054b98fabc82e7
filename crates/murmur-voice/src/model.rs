//! Speech model presence check.

use std::path::Path;

use murmur_platform::fs::FileSystem;
use murmur_types::{MurmurError, Result};

/// Fail with [`MurmurError::ModelMissing`] unless `path` is a directory.
///
/// Run this before opening the microphone. The error tells the user where
/// to download a model.
pub async fn ensure_model(fs: &dyn FileSystem, path: &Path) -> Result<()> {
    if fs.is_dir(path).await {
        tracing::debug!(path = %path.display(), "speech model found");
        Ok(())
    } else {
        Err(MurmurError::ModelMissing {
            path: path.to_path_buf(),
        })
    }
}
