pub mod archive_service;
pub mod item_service;
pub mod quota_service;
pub mod trash_service;

#[cfg(test)]
mod item_service_test;
