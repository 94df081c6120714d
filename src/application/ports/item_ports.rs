use async_trait::async_trait;
use tokio::io::AsyncRead;
use uuid::Uuid;

use crate::application::dtos::item_dto::ItemDto;
use crate::application::dtos::pagination::{PaginatedResponseDto, PaginationRequestDto};
use crate::common::errors::Result;
use crate::domain::repositories::item_repository::{SortDirection, SortKey};

/// Byte source handed in by the upload collaborator
pub type UploadStream = Box<dyn AsyncRead + Send + Unpin>;

/// Port for hierarchy use cases. The caller supplies an authenticated
/// `user_id`; every operation is scoped by it.
#[async_trait]
pub trait ItemUseCase: Send + Sync {
    /// Creates a folder under `parent_id` (None for root level)
    async fn create_folder(
        &self,
        user_id: Uuid,
        parent_id: Option<Uuid>,
        name: String,
    ) -> Result<ItemDto>;

    /// Persists an uploaded file under a collision-avoided name
    async fn upload_file(
        &self,
        user_id: Uuid,
        parent_id: Option<Uuid>,
        name: String,
        content_type: Option<String>,
        content: UploadStream,
    ) -> Result<ItemDto>;

    /// Renames a file or folder, cascading path updates to descendants
    async fn rename_item(&self, user_id: Uuid, item_id: Uuid, new_name: String) -> Result<ItemDto>;

    /// Moves an item under a different parent folder
    async fn move_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> Result<ItemDto>;

    /// Soft-deletes the item and, for folders, its whole subtree
    async fn soft_delete_item(&self, user_id: Uuid, item_id: Uuid) -> Result<()>;

    /// Point lookup
    async fn get_item(&self, user_id: Uuid, item_id: Uuid) -> Result<ItemDto>;

    /// Resolves a `/`-separated logical path to the item it names,
    /// matching each segment case-insensitively
    async fn get_item_by_path(&self, user_id: Uuid, path: &str) -> Result<ItemDto>;

    /// Single-level listing, folder-first
    async fn list_children(&self, user_id: Uuid, parent_id: Option<Uuid>) -> Result<Vec<ItemDto>>;

    /// Paginated listing with sort controls
    async fn list_paged(
        &self,
        user_id: Uuid,
        parent_id: Option<Uuid>,
        pagination: PaginationRequestDto,
        sort_by: SortKey,
        sort_dir: SortDirection,
    ) -> Result<PaginatedResponseDto<ItemDto>>;
}
