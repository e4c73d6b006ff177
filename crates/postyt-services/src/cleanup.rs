//! Scoped ownership of the uploaded video file
//!
//! The file is deleted exactly once: by `remove` after the upload settles, or by `Drop` if the
//! guard goes out of scope first (panic, early return, cancelled request).

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct TempVideoFile {
    path: PathBuf,
    removed: bool,
}

impl TempVideoFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. A file that is already gone counts as removed.
    pub async fn remove(mut self) -> io::Result<()> {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed temporary video");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Failed to remove temporary video");
                Err(e)
            }
        }
    }
}

impl Drop for TempVideoFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(error = %e, path = %self.path.display(), "Failed to remove temporary video on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::video_file;

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let (_, path) = video_file().keep().unwrap();
        let guard = TempVideoFile::new(&path);
        assert_eq!(guard.path(), path.as_path());

        guard.remove().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let guard = TempVideoFile::new(dir.path().join("gone.mp4"));
        assert!(guard.remove().await.is_ok());
    }

    #[test]
    fn test_drop_deletes_file() {
        let (_, path) = video_file().keep().unwrap();
        {
            let _guard = TempVideoFile::new(&path);
        }
        assert!(!path.exists());
    }
}
