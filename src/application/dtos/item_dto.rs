use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::item::{Item, ItemKind};

/// Wire representation of an item node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDto {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub parent_id: Option<Uuid>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Item> for ItemDto {
    fn from(item: &Item) -> Self {
        Self {
            id: *item.id(),
            name: item.name().to_string(),
            kind: item.kind().as_str().to_string(),
            parent_id: item.parent_id().copied(),
            file_path: item.file_path().map(String::from),
            file_size: item.file_size(),
            mime_type: item.mime_type().map(String::from),
            is_deleted: item.is_deleted(),
            deleted_at: item.deleted_at(),
            created_at: item.created_at(),
            updated_at: item.updated_at(),
        }
    }
}

impl From<Item> for ItemDto {
    fn from(item: Item) -> Self {
        Self::from(&item)
    }
}
