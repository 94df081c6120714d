pub mod item_pg_repository;
pub mod user_pg_repository;
