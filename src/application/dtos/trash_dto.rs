use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::item::Item;

/// Wire representation of a trashed item (a deleted-subtree root)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrashedItemDto {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub parent_id: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Days left before the expiry sweep removes the item for good
    pub days_until_deletion: i64,
}

impl TrashedItemDto {
    pub fn from_item(item: &Item, retention_days: u32) -> Self {
        let days_until_deletion = item
            .deleted_at()
            .map(|deleted_at| {
                let expiry = deleted_at + Duration::days(i64::from(retention_days));
                (expiry - Utc::now()).num_days().max(0)
            })
            .unwrap_or(0);

        Self {
            id: *item.id(),
            name: item.name().to_string(),
            kind: item.kind().as_str().to_string(),
            parent_id: item.parent_id().copied(),
            deleted_at: item.deleted_at(),
            days_until_deletion,
        }
    }
}
