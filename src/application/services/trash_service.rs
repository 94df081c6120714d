use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::application::dtos::pagination::{PaginatedResponseDto, PaginationRequestDto};
use crate::application::dtos::trash_dto::TrashedItemDto;
use crate::application::ports::trash_ports::TrashUseCase;
use crate::common::config::TrashConfig;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::item::{Item, ItemKind};
use crate::domain::repositories::item_repository::{
    ItemRepository, ListingScope, SortDirection, SortKey,
};
use crate::domain::services::mutation_planner::MutationPlanner;
use crate::domain::services::path_service::StoragePath;
use crate::infrastructure::services::filesystem_service::FilesystemService;
use crate::infrastructure::services::user_locks::UserLockRegistry;

const MAX_TREE_DEPTH: i32 = 10_000;

/// Trash lifecycle: listing deleted-subtree roots, restoring them, and
/// removing them for good (explicitly or via the retention sweep).
///
/// Soft-deleted entries keep their bytes on disk, so restore touches only
/// rows; permanent deletion removes rows first (FK cascade covers the
/// subtree) and the disk entry second.
pub struct TrashService {
    item_repository: Arc<dyn ItemRepository>,
    filesystem: Arc<FilesystemService>,
    locks: Arc<UserLockRegistry>,
    config: TrashConfig,
}

impl TrashService {
    pub fn new(
        item_repository: Arc<dyn ItemRepository>,
        filesystem: Arc<FilesystemService>,
        locks: Arc<UserLockRegistry>,
        config: TrashConfig,
    ) -> Self {
        Self {
            item_repository,
            filesystem,
            locks,
            config,
        }
    }

    /// Logical path rebuilt from the parent chain; deleted ancestors are
    /// followed too, a trashed subtree still has a disk location.
    async fn item_logical_path(&self, user_id: &Uuid, item: &Item) -> Result<StoragePath> {
        if let Some(path) = item.file_path() {
            return Ok(StoragePath::from_string(path));
        }

        let mut segments = vec![item.name().to_string()];
        let mut current = item.parent_id().copied();
        let mut depth = 0;

        while let Some(parent_id) = current {
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                return Err(DomainError::internal_error(
                    "Folder",
                    format!("Ancestor chain exceeds {} levels", MAX_TREE_DEPTH),
                ));
            }

            let parent = self
                .item_repository
                .get_item(user_id, &parent_id, Some(ItemKind::Folder))
                .await?
                .ok_or_else(|| DomainError::not_found("Folder", parent_id.to_string()))?;
            segments.push(parent.name().to_string());
            current = parent.parent_id().copied();
        }

        segments.reverse();
        Ok(StoragePath::new(segments))
    }

    /// Fails with `ParentDeleted` while any ancestor of `item` is still
    /// in the trash. Restoring into a deleted folder would resurrect an
    /// unreachable subtree.
    async fn ensure_ancestors_live(&self, user_id: &Uuid, item: &Item) -> Result<()> {
        let mut current = item.parent_id().copied();
        let mut depth = 0;

        while let Some(parent_id) = current {
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                return Err(DomainError::internal_error(
                    "Folder",
                    format!("Ancestor chain exceeds {} levels", MAX_TREE_DEPTH),
                ));
            }

            let parent = self
                .item_repository
                .get_item(user_id, &parent_id, Some(ItemKind::Folder))
                .await?
                .ok_or_else(|| DomainError::not_found("Folder", parent_id.to_string()))?;
            if parent.is_deleted() {
                return Err(DomainError::parent_deleted(item.id().to_string()));
            }
            current = parent.parent_id().copied();
        }
        Ok(())
    }

    /// Permanent removal with the user lock already held
    async fn purge_locked(&self, user_id: &Uuid, item: &Item) -> Result<()> {
        let logical = self.item_logical_path(user_id, item).await?;

        // Rows first: cascade removes the subtree atomically. The disk
        // entry second; a failure here leaves orphaned bytes, never
        // orphaned rows.
        self.item_repository
            .delete_permanently(user_id, item.id())
            .await?;
        self.filesystem.remove_entry(user_id, &logical).await?;

        tracing::info!("Permanently removed {} at {}", item.id(), logical);
        Ok(())
    }
}

#[async_trait]
impl TrashUseCase for TrashService {
    async fn list_trash(&self, user_id: Uuid) -> Result<Vec<TrashedItemDto>> {
        let roots = self.item_repository.trash_roots(&user_id).await?;
        Ok(roots
            .iter()
            .map(|item| TrashedItemDto::from_item(item, self.config.retention_days))
            .collect())
    }

    async fn list_trash_paged(
        &self,
        user_id: Uuid,
        pagination: PaginationRequestDto,
    ) -> Result<PaginatedResponseDto<TrashedItemDto>> {
        let pagination = pagination.validate_and_adjust();

        let (items, total) = self
            .item_repository
            .paged_listing(
                &user_id,
                None,
                pagination.offset() as i64,
                pagination.limit() as i64,
                SortKey::Modified,
                SortDirection::Descending,
                ListingScope::Trash,
            )
            .await?;

        Ok(PaginatedResponseDto::new(
            items
                .iter()
                .map(|item| TrashedItemDto::from_item(item, self.config.retention_days))
                .collect(),
            pagination.page,
            pagination.page_size,
            total as usize,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn restore_item(&self, user_id: Uuid, item_id: Uuid) -> Result<()> {
        let _guard = self.locks.acquire(&user_id).await;

        let item = self
            .item_repository
            .get_item(&user_id, &item_id, None)
            .await?
            .ok_or_else(|| DomainError::not_found("Item", item_id.to_string()))?;

        if !item.is_deleted() {
            // Already live; restoring again changes nothing
            return Ok(());
        }

        self.ensure_ancestors_live(&user_id, &item).await?;

        // The old name may have been taken while the item sat in trash
        if self
            .item_repository
            .name_exists(
                &user_id,
                item.name(),
                item.kind(),
                item.parent_id(),
                Some(&item_id),
                false,
            )
            .await?
        {
            return Err(DomainError::already_exists(
                "Item",
                format!(
                    "A {} named '{}' now occupies the restore location",
                    item.kind(),
                    item.name()
                ),
            ));
        }

        let mut subtree = vec![item.clone()];
        if item.is_folder() {
            subtree.extend(
                self.item_repository
                    .all_descendants(&user_id, &item_id, MAX_TREE_DEPTH, true)
                    .await?,
            );
        }

        let batch = MutationPlanner::plan_restore(&subtree, Utc::now());
        self.item_repository.apply_batch(&batch).await?;

        tracing::info!("Restored {} ({} rows including subtree)", item_id, batch.len());
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_permanently(&self, user_id: Uuid, item_id: Uuid) -> Result<()> {
        let _guard = self.locks.acquire(&user_id).await;

        let item = self
            .item_repository
            .get_item(&user_id, &item_id, None)
            .await?
            .ok_or_else(|| DomainError::not_found("Item", item_id.to_string()))?;

        if !item.is_deleted() {
            return Err(DomainError::validation_error(
                "Item",
                format!("Item {} is not in the trash", item_id),
            ));
        }

        self.purge_locked(&user_id, &item).await
    }

    #[tracing::instrument(skip(self))]
    async fn empty_trash(&self, user_id: Uuid) -> Result<()> {
        let _guard = self.locks.acquire(&user_id).await;

        let roots = self.item_repository.trash_roots(&user_id).await?;
        let total = roots.len();
        let mut removed = 0usize;
        for root in roots {
            // One stuck root must not keep the rest of the trash alive
            match self.purge_locked(&user_id, &root).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::error!("Failed to purge trash root {}: {}", root.id(), e);
                }
            }
        }

        tracing::info!(
            "Emptied trash for user {} ({}/{} roots)",
            user_id,
            removed,
            total
        );
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(i64::from(self.config.retention_days));
        let expired = self.item_repository.expired_items(cutoff).await?;

        let mut removed = 0;
        for item in expired {
            let user_id = *item.user_id();
            let _guard = self.locks.acquire(&user_id).await;

            // One stuck entry must not block the rest of the sweep
            match self.purge_locked(&user_id, &item).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::error!("Failed to purge expired item {}: {}", item.id(), e);
                }
            }
        }

        Ok(removed)
    }
}
