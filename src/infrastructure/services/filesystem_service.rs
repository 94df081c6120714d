use std::sync::Arc;

use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt, BufWriter};
use uuid::Uuid;

use crate::common::errors::{DomainError, Result};
use crate::domain::services::path_service::{PathService, StoragePath};

/// Physical mirror of the logical item tree: one directory per user,
/// directory and file names matching item names exactly.
///
/// Every operation resolves its logical path through [`PathService`],
/// so escape validation happens before any syscall.
pub struct FilesystemService {
    paths: Arc<PathService>,
}

impl FilesystemService {
    pub fn new(paths: Arc<PathService>) -> Self {
        Self { paths }
    }

    /// Creates the directory (and any missing ancestors) for a logical path
    pub async fn ensure_dir(&self, user_id: &Uuid, path: &StoragePath) -> Result<()> {
        let physical = self.paths.physical_path(user_id, path)?;

        if physical.exists() {
            if !physical.is_dir() {
                return Err(DomainError::io_error(
                    "Storage",
                    format!("Path exists but is not a directory: {}", physical.display()),
                ));
            }
            return Ok(());
        }

        fs::create_dir_all(&physical).await.map_err(|e| {
            DomainError::io_error(
                "Storage",
                format!("Failed to create directory: {}", physical.display()),
            )
            .with_source(e)
        })?;

        tracing::debug!("Created directory: {}", physical.display());
        Ok(())
    }

    /// Renames/moves a file or directory between two logical locations.
    /// The destination's parent directory is created when missing.
    pub async fn move_entry(
        &self,
        user_id: &Uuid,
        from: &StoragePath,
        to: &StoragePath,
    ) -> Result<()> {
        let physical_from = self.paths.physical_path(user_id, from)?;
        let physical_to = self.paths.physical_path(user_id, to)?;

        if let Some(parent) = physical_to.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::io_error(
                    "Storage",
                    format!("Failed to prepare destination: {}", parent.display()),
                )
                .with_source(e)
            })?;
        }

        fs::rename(&physical_from, &physical_to).await.map_err(|e| {
            DomainError::io_error(
                "Storage",
                format!(
                    "Failed to move {} to {}",
                    physical_from.display(),
                    physical_to.display()
                ),
            )
            .with_source(e)
        })?;

        tracing::debug!(
            "Moved {} -> {}",
            physical_from.display(),
            physical_to.display()
        );
        Ok(())
    }

    /// Removes a file or directory tree. A missing entry is logged and
    /// ignored: the DB row is already gone and the mirror just agrees.
    pub async fn remove_entry(&self, user_id: &Uuid, path: &StoragePath) -> Result<()> {
        let physical = self.paths.physical_path(user_id, path)?;

        let metadata = match fs::metadata(&physical).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Entry already absent on disk: {}", physical.display());
                return Ok(());
            }
            Err(e) => {
                return Err(DomainError::io_error(
                    "Storage",
                    format!("Failed to stat {}", physical.display()),
                )
                .with_source(e))
            }
        };

        let result = if metadata.is_dir() {
            fs::remove_dir_all(&physical).await
        } else {
            fs::remove_file(&physical).await
        };

        result.map_err(|e| {
            DomainError::io_error(
                "Storage",
                format!("Failed to remove {}", physical.display()),
            )
            .with_source(e)
        })?;

        tracing::debug!("Removed {}", physical.display());
        Ok(())
    }

    /// Writes an upload stream to the logical path, creating the parent
    /// directory when missing. Returns the number of bytes written.
    pub async fn save_stream<R>(
        &self,
        user_id: &Uuid,
        path: &StoragePath,
        mut content: R,
    ) -> Result<i64>
    where
        R: AsyncRead + Send + Unpin,
    {
        if let Some(parent) = path.parent() {
            self.ensure_dir(user_id, &parent).await?;
        } else {
            self.ensure_dir(user_id, &StoragePath::root()).await?;
        }

        let physical = self.paths.physical_path(user_id, path)?;
        let file = fs::File::create(&physical).await.map_err(|e| {
            DomainError::io_error(
                "Storage",
                format!("Failed to create file: {}", physical.display()),
            )
            .with_source(e)
        })?;

        let mut writer = BufWriter::new(file);
        let written = tokio::io::copy(&mut content, &mut writer).await.map_err(|e| {
            DomainError::io_error(
                "Storage",
                format!("Failed to write file: {}", physical.display()),
            )
            .with_source(e)
        })?;
        writer.flush().await.map_err(|e| {
            DomainError::io_error(
                "Storage",
                format!("Failed to flush file: {}", physical.display()),
            )
            .with_source(e)
        })?;

        tracing::debug!("Saved {} ({} bytes)", physical.display(), written);
        Ok(written as i64)
    }

    pub async fn entry_exists(&self, user_id: &Uuid, path: &StoragePath) -> Result<bool> {
        let physical = self.paths.physical_path(user_id, path)?;
        Ok(fs::metadata(&physical).await.is_ok())
    }
}
