//! Scoped scratch files for uploaded images

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::traits::ImageRef;
use crate::error::Result;

/// Process-local directory that holds uploads for the duration of one call
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure the scratch directory exists
    pub async fn ensure_dir(&self) -> Result<()> {
        if !fs::try_exists(&self.root).await.unwrap_or(false) {
            fs::create_dir_all(&self.root).await?;
            debug!(path = ?self.root, "Created scratch directory");
        }
        Ok(())
    }

    /// Write `data` to a freshly named file. The name carries a UUIDv7 so
    /// concurrent requests never collide.
    pub async fn acquire(&self, data: &[u8], extension: &str, mime_type: &str) -> Result<TempImage> {
        self.ensure_dir().await?;

        let filename = format!("image_temp_{}.{}", Uuid::now_v7(), extension);
        let path = self.root.join(filename);

        fs::write(&path, data).await?;
        debug!(path = ?path, size = data.len(), "Wrote scratch image");

        Ok(TempImage {
            image: ImageRef {
                path,
                mime_type: mime_type.to_string(),
            },
            released: false,
        })
    }
}

/// An uploaded image on disk. The file is removed by [`TempImage::release`],
/// or on drop if the owning future unwinds or is cancelled first.
#[derive(Debug)]
pub struct TempImage {
    image: ImageRef,
    released: bool,
}

impl TempImage {
    pub fn image_ref(&self) -> &ImageRef {
        &self.image
    }

    pub fn path(&self) -> &Path {
        &self.image.path
    }

    /// Remove the file. Failures are logged, never surfaced: the caller's
    /// outcome is already decided.
    pub async fn release(mut self) {
        self.released = true;
        match fs::remove_file(&self.image.path).await {
            Ok(()) => debug!(path = ?self.image.path, "Removed scratch image"),
            Err(e) => warn!(path = ?self.image.path, error = %e, "Failed to remove scratch image"),
        }
    }
}

impl Drop for TempImage {
    fn drop(&mut self) {
        if !self.released {
            // Blocking, but only reached when release() was skipped by a panic or cancellation
            if let Err(e) = std::fs::remove_file(&self.image.path) {
                warn!(path = ?self.image.path, error = %e, "Failed to remove scratch image on drop");
            }
        }
    }
}
