pub mod item_repository;
pub mod user_repository;
