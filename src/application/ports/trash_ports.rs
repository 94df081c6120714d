use async_trait::async_trait;
use uuid::Uuid;

use crate::application::dtos::pagination::{PaginatedResponseDto, PaginationRequestDto};
use crate::application::dtos::trash_dto::TrashedItemDto;
use crate::common::errors::Result;

/// Port for trash-related use cases
#[async_trait]
pub trait TrashUseCase: Send + Sync {
    /// Lists the roots of deleted subtrees in the user's trash
    async fn list_trash(&self, user_id: Uuid) -> Result<Vec<TrashedItemDto>>;

    /// Paged trash view, most recently deleted first
    async fn list_trash_paged(
        &self,
        user_id: Uuid,
        pagination: PaginationRequestDto,
    ) -> Result<PaginatedResponseDto<TrashedItemDto>>;

    /// Restores an item (and its subtree) from trash. Fails with
    /// `ParentDeleted` while an ancestor is still trashed.
    async fn restore_item(&self, user_id: Uuid, item_id: Uuid) -> Result<()>;

    /// Permanently removes an item: DB rows first, disk entry second
    async fn delete_permanently(&self, user_id: Uuid, item_id: Uuid) -> Result<()>;

    /// Permanently removes everything in the user's trash
    async fn empty_trash(&self, user_id: Uuid) -> Result<()>;

    /// Removes items deleted longer ago than the retention window.
    /// Called by the periodic sweep; returns the number of removed roots.
    async fn purge_expired(&self) -> Result<usize>;
}
