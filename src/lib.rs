// Export the main project modules
pub mod common;
pub mod domain;
pub mod application;
pub mod infrastructure;

// Common public re-exports
pub use application::services::archive_service::ArchiveService;
pub use application::services::item_service::ItemService;
pub use application::services::quota_service::QuotaService;
pub use application::services::trash_service::TrashService;
pub use common::config::AppConfig;
pub use common::errors::{DomainError, ErrorKind};
pub use domain::entities::item::{Item, ItemKind};
pub use domain::services::path_service::{PathService, StoragePath};
pub use infrastructure::repositories::pg::item_pg_repository::ItemPgRepository;
pub use infrastructure::repositories::pg::user_pg_repository::UserPgRepository;
pub use infrastructure::services::filesystem_service::FilesystemService;
pub use infrastructure::services::trash_cleanup_service::TrashCleanupService;
pub use infrastructure::services::user_locks::UserLockRegistry;
