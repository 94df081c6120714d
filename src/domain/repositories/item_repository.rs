use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::common::errors::{DomainError, ErrorKind};
use crate::domain::entities::item::{Item, ItemKind};

/// Errors that can occur in item repository operations
#[derive(Debug, thiserror::Error)]
pub enum ItemRepositoryError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Item already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid item data: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ItemRepositoryError> for DomainError {
    fn from(err: ItemRepositoryError) -> Self {
        match err {
            ItemRepositoryError::NotFound(msg) => DomainError::not_found("Item", msg),
            ItemRepositoryError::AlreadyExists(msg) => DomainError::already_exists("Item", msg),
            ItemRepositoryError::InvalidData(msg) => DomainError::validation_error("Item", msg),
            ItemRepositoryError::DatabaseError(msg) => {
                DomainError::new(ErrorKind::Internal, "Item", msg)
            }
        }
    }
}

/// Result type for item repository operations
pub type ItemRepositoryResult<T> = Result<T, ItemRepositoryError>;

/// Sort keys for directory listings. Folders always sort before files
/// regardless of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Listing scope: a live directory level, or the trash view which
/// surfaces only the roots of deleted subtrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    Live,
    Trash,
}

/// Repository port for the item hierarchy. Reads are the tree-query
/// surface (absence is `None`/empty, never an error); writes are the
/// transactional persistence surface (all-or-nothing batches).
///
/// Every operation is scoped to one `user_id` for tenant isolation.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Single-level listing, folder-first then name
    async fn direct_children(
        &self,
        user_id: &Uuid,
        parent_id: Option<&Uuid>,
        kind: Option<ItemKind>,
        include_deleted: bool,
    ) -> ItemRepositoryResult<Vec<Item>>;

    /// Every item reachable from `root_id`, excluding the root itself.
    /// One round-trip regardless of depth; level-ordered (non-decreasing
    /// depth), folder-before-file and name-ascending within a level.
    /// `max_depth` guards against pathological data.
    async fn all_descendants(
        &self,
        user_id: &Uuid,
        root_id: &Uuid,
        max_depth: i32,
        include_deleted: bool,
    ) -> ItemRepositoryResult<Vec<Item>>;

    /// Point lookup scoped by owner and optional kind filter
    async fn get_item(
        &self,
        user_id: &Uuid,
        id: &Uuid,
        kind: Option<ItemKind>,
    ) -> ItemRepositoryResult<Option<Item>>;

    /// Case-insensitive name match within one directory level
    async fn get_item_by_name(
        &self,
        user_id: &Uuid,
        name: &str,
        parent_id: Option<&Uuid>,
        include_deleted: bool,
    ) -> ItemRepositoryResult<Option<Item>>;

    /// Paged listing with total count
    async fn paged_listing(
        &self,
        user_id: &Uuid,
        parent_id: Option<&Uuid>,
        offset: i64,
        limit: i64,
        sort_by: SortKey,
        sort_dir: SortDirection,
        scope: ListingScope,
    ) -> ItemRepositoryResult<(Vec<Item>, i64)>;

    /// Roots of deleted subtrees for the trash view
    async fn trash_roots(&self, user_id: &Uuid) -> ItemRepositoryResult<Vec<Item>>;

    /// Uniqueness probe used by mutation validators: case-insensitive
    /// match on (name, kind) among siblings, optionally excluding one id
    async fn name_exists(
        &self,
        user_id: &Uuid,
        name: &str,
        kind: ItemKind,
        parent_id: Option<&Uuid>,
        exclude_id: Option<&Uuid>,
        include_deleted: bool,
    ) -> ItemRepositoryResult<bool>;

    /// Inserts one item inside a transaction
    async fn add_item(&self, item: &Item) -> ItemRepositoryResult<()>;

    /// Applies a mutation batch in one transaction: every row is updated
    /// or none is. Partial application is never observable.
    async fn apply_batch(&self, items: &[Item]) -> ItemRepositoryResult<()>;

    /// Removes the row; FK cascade removes the subtree rows with it.
    /// Physical removal is the caller's separate step.
    async fn delete_permanently(&self, user_id: &Uuid, id: &Uuid) -> ItemRepositoryResult<()>;

    /// Deleted-subtree roots whose `deleted_at` predates `cutoff`,
    /// across all users; consumed by the expiry sweep
    async fn expired_items(&self, cutoff: DateTime<Utc>) -> ItemRepositoryResult<Vec<Item>>;
}
