pub mod item_dto;
pub mod pagination;
pub mod trash_dto;
