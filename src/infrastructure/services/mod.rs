pub mod filesystem_service;
pub mod trash_cleanup_service;
pub mod user_locks;
