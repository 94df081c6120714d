use std::collections::HashMap;
use std::io::{Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::io::ReaderStream;
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::application::ports::archive_ports::{ArchiveDownload, ArchiveUseCase};
use crate::common::config::ArchiveConfig;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::item::{Item, ItemKind};
use crate::domain::repositories::item_repository::ItemRepository;
use crate::domain::services::path_service::{PathService, StoragePath};

/// One planned archive entry: a directory marker or a file to copy in
enum ArchiveEntry {
    Dir {
        entry_path: String,
    },
    File {
        entry_path: String,
        physical: PathBuf,
        size: u64,
    },
}

/// Builds ZIP downloads for a folder or an arbitrary selection.
///
/// Limits are validated against stored sizes before any archive byte is
/// produced, so an oversized request fails fast instead of half-way
/// through a download. The archive is assembled into an unlinked temp
/// file on a blocking thread, then streamed out.
pub struct ArchiveService {
    item_repository: Arc<dyn ItemRepository>,
    paths: Arc<PathService>,
    config: ArchiveConfig,
}

impl ArchiveService {
    pub fn new(
        item_repository: Arc<dyn ItemRepository>,
        paths: Arc<PathService>,
        config: ArchiveConfig,
    ) -> Self {
        Self {
            item_repository,
            paths,
            config,
        }
    }

    /// Plans entries for one subtree, rooted at `base` inside the archive.
    /// Descendants arrive level-ordered, so each parent's relative path is
    /// known before its children need it.
    async fn plan_subtree(
        &self,
        user_id: &Uuid,
        folder: &Item,
        base: &StoragePath,
        entries: &mut Vec<ArchiveEntry>,
    ) -> Result<()> {
        let descendants = self
            .item_repository
            .all_descendants(user_id, folder.id(), self.config.max_depth, false)
            .await?;

        let mut relative: HashMap<Uuid, StoragePath> = HashMap::new();
        for item in &descendants {
            let parent_rel = item
                .parent_id()
                .and_then(|pid| relative.get(pid))
                .cloned()
                .unwrap_or_else(StoragePath::root);
            let rel = parent_rel.join(item.name());

            // Entry path is the subtree-relative path spliced under the base
            let entry_path = StoragePath::new(
                base.segments()
                    .iter()
                    .chain(rel.segments().iter())
                    .cloned()
                    .collect(),
            );

            match item.kind() {
                ItemKind::Folder => entries.push(ArchiveEntry::Dir {
                    entry_path: entry_path.to_relative_string(),
                }),
                ItemKind::File => {
                    let logical = StoragePath::from_string(item.file_path().ok_or_else(|| {
                        DomainError::internal_error(
                            "Item",
                            format!("File {} has no stored path", item.id()),
                        )
                    })?);
                    entries.push(ArchiveEntry::File {
                        entry_path: entry_path.to_relative_string(),
                        physical: self.paths.physical_path(user_id, &logical)?,
                        size: item.file_size().unwrap_or(0).max(0) as u64,
                    });
                }
            }

            relative.insert(*item.id(), rel);
        }
        Ok(())
    }

    fn validate_limits(&self, entries: &[ArchiveEntry]) -> Result<()> {
        let mut file_count = 0usize;
        let mut total_bytes = 0u64;
        for entry in entries {
            if let ArchiveEntry::File { size, .. } = entry {
                file_count += 1;
                total_bytes += size;
            }
        }

        if file_count > self.config.max_entries {
            return Err(DomainError::too_many_files(file_count, self.config.max_entries));
        }
        if total_bytes > self.config.max_total_bytes {
            return Err(DomainError::archive_too_large(
                total_bytes,
                self.config.max_total_bytes,
            ));
        }
        Ok(())
    }

    /// Writes the planned entries into an unlinked temp file and returns
    /// the finished archive as a stream.
    async fn build(&self, entries: Vec<ArchiveEntry>, suggested_name: String) -> Result<ArchiveDownload> {
        self.validate_limits(&entries)?;

        let archive = tokio::task::spawn_blocking(move || -> Result<std::fs::File> {
            let mut staging = tempfile::tempfile()?;
            {
                let mut zip = ZipWriter::new(&mut staging);
                let options =
                    FileOptions::default().compression_method(CompressionMethod::Deflated);

                for entry in entries {
                    match entry {
                        ArchiveEntry::Dir { entry_path } => {
                            zip.add_directory(entry_path, options)?;
                        }
                        ArchiveEntry::File {
                            entry_path,
                            physical,
                            ..
                        } => match std::fs::File::open(&physical) {
                            Ok(mut file) => {
                                zip.start_file(entry_path, options)?;
                                std::io::copy(&mut file, &mut zip)?;
                            }
                            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                                // A row without bytes: skip the entry so
                                // the rest of the archive still downloads
                                tracing::warn!(
                                    "Skipping missing file {} in archive",
                                    physical.display()
                                );
                            }
                            Err(e) => return Err(e.into()),
                        },
                    }
                }
                zip.finish()?;
            }
            staging.seek(SeekFrom::Start(0))?;
            Ok(staging)
        })
        .await??;

        let stream = ReaderStream::new(tokio::fs::File::from_std(archive));
        Ok(ArchiveDownload {
            stream: Box::pin(stream),
            suggested_name,
        })
    }
}

#[async_trait]
impl ArchiveUseCase for ArchiveService {
    #[tracing::instrument(skip(self))]
    async fn stream_folder(&self, user_id: Uuid, folder_id: Uuid) -> Result<ArchiveDownload> {
        let folder = self
            .item_repository
            .get_item(&user_id, &folder_id, Some(ItemKind::Folder))
            .await?
            .filter(|f| !f.is_deleted())
            .ok_or_else(|| DomainError::not_found("Folder", folder_id.to_string()))?;

        let mut entries = Vec::new();
        self.plan_subtree(&user_id, &folder, &StoragePath::root(), &mut entries)
            .await?;

        self.build(entries, format!("{}.zip", folder.name())).await
    }

    #[tracing::instrument(skip(self))]
    async fn stream_selection(
        &self,
        user_id: Uuid,
        item_ids: Vec<Uuid>,
    ) -> Result<ArchiveDownload> {
        if item_ids.is_empty() {
            return Err(DomainError::validation_error(
                "Archive",
                "Selection is empty",
            ));
        }

        let mut entries = Vec::new();
        for item_id in &item_ids {
            let item = self
                .item_repository
                .get_item(&user_id, item_id, None)
                .await?
                .filter(|i| !i.is_deleted())
                .ok_or_else(|| DomainError::not_found("Item", item_id.to_string()))?;

            match item.kind() {
                ItemKind::Folder => {
                    // The folder itself becomes a top-level directory
                    let base = StoragePath::root().join(item.name());
                    entries.push(ArchiveEntry::Dir {
                        entry_path: base.to_relative_string(),
                    });
                    self.plan_subtree(&user_id, &item, &base, &mut entries)
                        .await?;
                }
                ItemKind::File => {
                    let logical = StoragePath::from_string(item.file_path().ok_or_else(|| {
                        DomainError::internal_error(
                            "Item",
                            format!("File {} has no stored path", item.id()),
                        )
                    })?);
                    entries.push(ArchiveEntry::File {
                        entry_path: item.name().to_string(),
                        physical: self.paths.physical_path(&user_id, &logical)?,
                        size: item.file_size().unwrap_or(0).max(0) as u64,
                    });
                }
            }
        }

        let name = format!(
            "selection-{}.zip",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        );
        self.build(entries, name).await
    }
}
