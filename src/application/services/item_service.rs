use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::dtos::item_dto::ItemDto;
use crate::application::dtos::pagination::{PaginatedResponseDto, PaginationRequestDto};
use crate::application::ports::item_ports::{ItemUseCase, UploadStream};
use crate::application::transactions::storage_transaction::StorageTransaction;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::item::{Item, ItemError, ItemKind};
use crate::domain::repositories::item_repository::{
    ItemRepository, ListingScope, SortDirection, SortKey,
};
use crate::domain::services::mutation_planner::MutationPlanner;
use crate::domain::services::path_service::StoragePath;
use crate::infrastructure::services::filesystem_service::FilesystemService;
use crate::infrastructure::services::user_locks::UserLockRegistry;

/// Depth cap for ancestor walks and subtree queries
const MAX_TREE_DEPTH: i32 = 10_000;

/// Attempts before giving up on a collision-free upload name
const MAX_NAME_PROBES: u32 = 1_000;

/// Orchestrates hierarchy mutations across the database and the physical
/// mirror.
///
/// Structural mutations for one user are serialized through
/// [`UserLockRegistry`]; each flow performs its physical step first and
/// commits the row batch second, registering a compensation that undoes
/// the physical step when the commit fails. Folder creation is the one
/// inversion: the row goes in first because an empty directory is cheaper
/// to compensate than an orphaned row is to detect.
pub struct ItemService {
    item_repository: Arc<dyn ItemRepository>,
    filesystem: Arc<FilesystemService>,
    locks: Arc<UserLockRegistry>,
}

impl ItemService {
    pub fn new(
        item_repository: Arc<dyn ItemRepository>,
        filesystem: Arc<FilesystemService>,
        locks: Arc<UserLockRegistry>,
    ) -> Self {
        Self {
            item_repository,
            filesystem,
            locks,
        }
    }

    fn map_item_error(err: ItemError) -> DomainError {
        DomainError::validation_error("Item", err.to_string())
    }

    /// Logical path of a folder, rebuilt from the parent chain. Folders
    /// store no path column, so this is the only way to locate one.
    async fn folder_logical_path(&self, user_id: &Uuid, folder: &Item) -> Result<StoragePath> {
        let mut segments = vec![folder.name().to_string()];
        let mut current = folder.parent_id().copied();
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

    async fn item_logical_path(&self, user_id: &Uuid, item: &Item) -> Result<StoragePath> {
        match item.file_path() {
            Some(path) => Ok(StoragePath::from_string(path)),
            None if item.is_folder() => self.folder_logical_path(user_id, item).await,
            None => Err(DomainError::internal_error(
                "Item",
                format!("File {} has no stored path", item.id()),
            )),
        }
    }

    /// Resolves and validates a destination parent: `None` is the user
    /// root, otherwise the id must name a live folder of this user.
    async fn resolve_parent(
        &self,
        user_id: &Uuid,
        parent_id: Option<&Uuid>,
    ) -> Result<StoragePath> {
        match parent_id {
            None => Ok(StoragePath::root()),
            Some(pid) => {
                let parent = self
                    .item_repository
                    .get_item(user_id, pid, Some(ItemKind::Folder))
                    .await?
                    .ok_or_else(|| DomainError::not_found("Folder", pid.to_string()))?;

                if parent.is_deleted() {
                    return Err(DomainError::parent_deleted(pid.to_string()));
                }

                self.folder_logical_path(user_id, &parent).await
            }
        }
    }

    async fn get_live_item(&self, user_id: &Uuid, item_id: &Uuid) -> Result<Item> {
        let item = self
            .item_repository
            .get_item(user_id, item_id, None)
            .await?
            .ok_or_else(|| DomainError::not_found("Item", item_id.to_string()))?;

        if item.is_deleted() {
            // A trashed item is invisible to the live surface
            return Err(DomainError::not_found("Item", item_id.to_string()));
        }
        Ok(item)
    }

    async fn subtree(&self, user_id: &Uuid, item: &Item) -> Result<Vec<Item>> {
        if item.is_folder() {
            Ok(self
                .item_repository
                .all_descendants(user_id, item.id(), MAX_TREE_DEPTH, true)
                .await?)
        } else {
            Ok(Vec::new())
        }
    }

    /// Returns `name` when free among live siblings of the same kind,
    /// otherwise the first free `stem(n).ext` variant.
    async fn collision_free_name(
        &self,
        user_id: &Uuid,
        parent_id: Option<&Uuid>,
        name: &str,
        kind: ItemKind,
    ) -> Result<String> {
        if !self
            .item_repository
            .name_exists(user_id, name, kind, parent_id, None, false)
            .await?
        {
            return Ok(name.to_string());
        }

        let (stem, extension) = match name.rsplit_once('.') {
            Some((s, e)) if !s.is_empty() => (s, Some(e)),
            _ => (name, None),
        };

        for counter in 1..=MAX_NAME_PROBES {
            let candidate = match extension {
                Some(ext) => format!("{}({}).{}", stem, counter, ext),
                None => format!("{}({})", stem, counter),
            };
            if !self
                .item_repository
                .name_exists(user_id, &candidate, kind, parent_id, None, false)
                .await?
            {
                return Ok(candidate);
            }
        }

        Err(DomainError::already_exists(
            "Item",
            format!("No free variant of '{}' after {} probes", name, MAX_NAME_PROBES),
        ))
    }

    async fn ensure_name_free(
        &self,
        user_id: &Uuid,
        name: &str,
        kind: ItemKind,
        parent_id: Option<&Uuid>,
        exclude_id: Option<&Uuid>,
    ) -> Result<()> {
        if self
            .item_repository
            .name_exists(user_id, name, kind, parent_id, exclude_id, false)
            .await?
        {
            return Err(DomainError::already_exists(
                "Item",
                format!("A {} named '{}' already exists here", kind, name),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemUseCase for ItemService {
    #[tracing::instrument(skip(self))]
    async fn create_folder(
        &self,
        user_id: Uuid,
        parent_id: Option<Uuid>,
        name: String,
    ) -> Result<ItemDto> {
        let _guard = self.locks.acquire(&user_id).await;

        let parent_path = self.resolve_parent(&user_id, parent_id.as_ref()).await?;
        self.ensure_name_free(&user_id, &name, ItemKind::Folder, parent_id.as_ref(), None)
            .await?;

        let folder =
            Item::new_folder(user_id, name, parent_id).map_err(Self::map_item_error)?;
        let folder_path = parent_path.join(folder.name());

        let mut tx = StorageTransaction::new("create_folder");
        {
            let repo = self.item_repository.clone();
            let row = folder.clone();
            let undo_repo = self.item_repository.clone();
            let undo_id = *folder.id();
            tx.add_step(
                async move { repo.add_item(&row).await.map_err(DomainError::from) },
                async move {
                    undo_repo
                        .delete_permanently(&user_id, &undo_id)
                        .await
                        .map_err(DomainError::from)
                },
            );
        }
        {
            let fs = self.filesystem.clone();
            let path = folder_path.clone();
            tx.add_irreversible_step(async move { fs.ensure_dir(&user_id, &path).await });
        }
        tx.commit().await?;

        tracing::info!("Created folder {} at {}", folder.id(), folder_path);
        Ok(ItemDto::from(folder))
    }

    #[tracing::instrument(skip(self, content))]
    async fn upload_file(
        &self,
        user_id: Uuid,
        parent_id: Option<Uuid>,
        name: String,
        content_type: Option<String>,
        mut content: UploadStream,
    ) -> Result<ItemDto> {
        let _guard = self.locks.acquire(&user_id).await;

        let parent_path = self.resolve_parent(&user_id, parent_id.as_ref()).await?;
        let final_name = self
            .collision_free_name(&user_id, parent_id.as_ref(), &name, ItemKind::File)
            .await?;
        let logical = parent_path.join(&final_name);

        // Bytes land on disk first; a failed row insert unlinks them
        let size = self
            .filesystem
            .save_stream(&user_id, &logical, &mut content)
            .await?;

        let mime_type = content_type.unwrap_or_else(|| {
            mime_guess::from_path(&final_name)
                .first_or_octet_stream()
                .to_string()
        });

        let file = Item::new_file(
            user_id,
            final_name,
            parent_id,
            logical.to_relative_string(),
            size,
            mime_type,
        )
        .map_err(Self::map_item_error)?;

        if let Err(e) = self.item_repository.add_item(&file).await {
            if let Err(cleanup) = self.filesystem.remove_entry(&user_id, &logical).await {
                tracing::error!(
                    "Failed to unlink {} after aborted upload: {}",
                    logical,
                    cleanup
                );
            }
            return Err(e.into());
        }

        tracing::info!("Uploaded {} ({} bytes) as {}", logical, size, file.id());
        Ok(ItemDto::from(file))
    }

    #[tracing::instrument(skip(self))]
    async fn rename_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        new_name: String,
    ) -> Result<ItemDto> {
        let _guard = self.locks.acquire(&user_id).await;

        let item = self.get_live_item(&user_id, &item_id).await?;
        if item.name() == new_name {
            return Ok(ItemDto::from(item));
        }

        self.ensure_name_free(
            &user_id,
            &new_name,
            item.kind(),
            item.parent_id(),
            Some(&item_id),
        )
        .await?;

        let old_path = self.item_logical_path(&user_id, &item).await?;
        let new_path = match old_path.parent() {
            Some(parent) => parent.join(&new_name),
            None => StoragePath::from_string(&new_name),
        };

        let descendants = self.subtree(&user_id, &item).await?;
        let folder_path = item.is_folder().then(|| old_path.clone());
        let batch =
            MutationPlanner::plan_rename(&item, &new_name, folder_path.as_ref(), &descendants)
                .map_err(Self::map_item_error)?;
        let updated = batch[0].clone();

        let mut tx = StorageTransaction::new("rename_item");
        {
            let fs = self.filesystem.clone();
            let (from, to) = (old_path.clone(), new_path.clone());
            let undo_fs = self.filesystem.clone();
            let (undo_from, undo_to) = (new_path.clone(), old_path.clone());
            tx.add_step(
                async move { fs.move_entry(&user_id, &from, &to).await },
                async move { undo_fs.move_entry(&user_id, &undo_from, &undo_to).await },
            );
        }
        {
            let repo = self.item_repository.clone();
            tx.add_irreversible_step(async move {
                repo.apply_batch(&batch).await.map_err(DomainError::from)
            });
        }
        tx.commit().await?;

        tracing::info!("Renamed {}: {} -> {}", item_id, old_path, new_path);
        Ok(ItemDto::from(updated))
    }

    #[tracing::instrument(skip(self))]
    async fn move_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> Result<ItemDto> {
        let _guard = self.locks.acquire(&user_id).await;

        let item = self.get_live_item(&user_id, &item_id).await?;
        if item.parent_id().copied() == new_parent_id {
            return Ok(ItemDto::from(item));
        }

        let new_parent_path = self
            .resolve_parent(&user_id, new_parent_id.as_ref())
            .await?;
        self.ensure_name_free(
            &user_id,
            item.name(),
            item.kind(),
            new_parent_id.as_ref(),
            Some(&item_id),
        )
        .await?;

        let old_path = self.item_logical_path(&user_id, &item).await?;
        let descendants = self.subtree(&user_id, &item).await?;

        let batch = MutationPlanner::plan_move(
            &item,
            new_parent_id,
            &old_path,
            &new_parent_path,
            &descendants,
        )
        .map_err(Self::map_item_error)?;
        let updated = batch[0].clone();
        let new_path = new_parent_path.join(item.name());

        let mut tx = StorageTransaction::new("move_item");
        {
            let fs = self.filesystem.clone();
            let (from, to) = (old_path.clone(), new_path.clone());
            let undo_fs = self.filesystem.clone();
            let (undo_from, undo_to) = (new_path.clone(), old_path.clone());
            tx.add_step(
                async move { fs.move_entry(&user_id, &from, &to).await },
                async move { undo_fs.move_entry(&user_id, &undo_from, &undo_to).await },
            );
        }
        {
            let repo = self.item_repository.clone();
            tx.add_irreversible_step(async move {
                repo.apply_batch(&batch).await.map_err(DomainError::from)
            });
        }
        tx.commit().await?;

        tracing::info!("Moved {}: {} -> {}", item_id, old_path, new_path);
        Ok(ItemDto::from(updated))
    }

    #[tracing::instrument(skip(self))]
    async fn soft_delete_item(&self, user_id: Uuid, item_id: Uuid) -> Result<()> {
        let _guard = self.locks.acquire(&user_id).await;

        let item = self
            .item_repository
            .get_item(&user_id, &item_id, None)
            .await?
            .ok_or_else(|| DomainError::not_found("Item", item_id.to_string()))?;

        if item.is_deleted() {
            // Deleting from trash again is a no-op
            return Ok(());
        }

        // Disk entries stay in place until permanent deletion; only the
        // rows change, so no compensation pair is needed here.
        let descendants = self.subtree(&user_id, &item).await?;
        let batch = MutationPlanner::plan_soft_delete(&item, &descendants, chrono::Utc::now());
        self.item_repository.apply_batch(&batch).await?;

        tracing::info!(
            "Soft-deleted {} ({} rows including subtree)",
            item_id,
            batch.len()
        );
        Ok(())
    }

    async fn get_item(&self, user_id: Uuid, item_id: Uuid) -> Result<ItemDto> {
        let item = self.get_live_item(&user_id, &item_id).await?;
        Ok(ItemDto::from(item))
    }

    async fn get_item_by_path(&self, user_id: Uuid, path: &str) -> Result<ItemDto> {
        let storage_path = StoragePath::from_string(path);
        if storage_path.is_empty() {
            return Err(DomainError::validation_error("Item", "Path is empty"));
        }

        let mut parent_id: Option<Uuid> = None;
        let mut found: Option<Item> = None;
        for segment in storage_path.segments() {
            // A file mid-path has no children, so the next segment misses
            let item = self
                .item_repository
                .get_item_by_name(&user_id, segment, parent_id.as_ref(), false)
                .await?
                .ok_or_else(|| DomainError::not_found("Item", path.to_string()))?;
            parent_id = Some(*item.id());
            found = Some(item);
        }

        found
            .map(ItemDto::from)
            .ok_or_else(|| DomainError::not_found("Item", path.to_string()))
    }

    async fn list_children(
        &self,
        user_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Vec<ItemDto>> {
        let children = self
            .item_repository
            .direct_children(&user_id, parent_id.as_ref(), None, false)
            .await?;
        Ok(children.iter().map(ItemDto::from).collect())
    }

    async fn list_paged(
        &self,
        user_id: Uuid,
        parent_id: Option<Uuid>,
        pagination: PaginationRequestDto,
        sort_by: SortKey,
        sort_dir: SortDirection,
    ) -> Result<PaginatedResponseDto<ItemDto>> {
        let pagination = pagination.validate_and_adjust();

        let (items, total) = self
            .item_repository
            .paged_listing(
                &user_id,
                parent_id.as_ref(),
                pagination.offset() as i64,
                pagination.limit() as i64,
                sort_by,
                sort_dir,
                ListingScope::Live,
            )
            .await?;

        Ok(PaginatedResponseDto::new(
            items.iter().map(ItemDto::from).collect(),
            pagination.page,
            pagination.page_size,
            total as usize,
        ))
    }
}
