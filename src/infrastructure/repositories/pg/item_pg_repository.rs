use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::item::{Item, ItemKind};
use crate::domain::repositories::item_repository::{
    ItemRepository, ItemRepositoryError, ItemRepositoryResult, ListingScope, SortDirection,
    SortKey,
};

const ITEM_COLUMNS: &str = "id, user_id, parent_id, name, kind, file_path, file_size, \
     mime_type, is_deleted, deleted_at, created_at, updated_at";

pub struct ItemPgRepository {
    pool: Arc<PgPool>,
}

impl ItemPgRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    // Helper to map SQL errors to repository errors
    fn map_sqlx_error(err: sqlx::Error) -> ItemRepositoryError {
        match err {
            sqlx::Error::RowNotFound => {
                ItemRepositoryError::NotFound("Item not found".to_string())
            }
            sqlx::Error::Database(db_err) => {
                if db_err.code().map_or(false, |code| code == "23505") {
                    // PostgreSQL unique violation
                    ItemRepositoryError::AlreadyExists(
                        "Item with this name already exists".to_string(),
                    )
                } else {
                    ItemRepositoryError::DatabaseError(format!("Database error: {}", db_err))
                }
            }
            _ => ItemRepositoryError::DatabaseError(format!("Database error: {}", err)),
        }
    }

    fn row_to_item(row: &PgRow) -> ItemRepositoryResult<Item> {
        let kind_str: String = row.get("kind");
        let kind = ItemKind::from_str(&kind_str).ok_or_else(|| {
            ItemRepositoryError::InvalidData(format!("Unknown item kind: {}", kind_str))
        })?;

        Ok(Item::from_row(
            row.get("id"),
            row.get("user_id"),
            row.get("name"),
            kind,
            row.get("parent_id"),
            row.get("file_path"),
            row.get("file_size"),
            row.get("mime_type"),
            row.get("is_deleted"),
            row.get("deleted_at"),
            row.get("created_at"),
            row.get("updated_at"),
        ))
    }

    fn rows_to_items(rows: Vec<PgRow>) -> ItemRepositoryResult<Vec<Item>> {
        rows.iter().map(Self::row_to_item).collect()
    }
}

#[async_trait]
impl ItemRepository for ItemPgRepository {
    async fn direct_children(
        &self,
        user_id: &Uuid,
        parent_id: Option<&Uuid>,
        kind: Option<ItemKind>,
        include_deleted: bool,
    ) -> ItemRepositoryResult<Vec<Item>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM storage.items
            WHERE user_id = $1
              AND parent_id IS NOT DISTINCT FROM $2
              AND ($3::varchar IS NULL OR kind = $3)
              AND (is_deleted = FALSE OR $4)
            ORDER BY (kind = 'folder') DESC, lower(name) ASC
            "#
        ))
        .bind(user_id)
        .bind(parent_id.copied())
        .bind(kind.map(|k| k.as_str()))
        .bind(include_deleted)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Self::rows_to_items(rows)
    }

    async fn all_descendants(
        &self,
        user_id: &Uuid,
        root_id: &Uuid,
        max_depth: i32,
        include_deleted: bool,
    ) -> ItemRepositoryResult<Vec<Item>> {
        // Recursive CTE walks the whole subtree in one round trip.
        // Depth ordering lets the caller process parents before children.
        let rows = sqlx::query(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT i.*, 1 AS depth
                FROM storage.items i
                WHERE i.user_id = $1 AND i.parent_id = $2
                UNION ALL
                SELECT c.*, s.depth + 1
                FROM storage.items c
                JOIN subtree s ON c.parent_id = s.id
                WHERE c.user_id = $1 AND s.depth < $3
            )
            SELECT id, user_id, parent_id, name, kind, file_path, file_size,
                   mime_type, is_deleted, deleted_at, created_at, updated_at
            FROM subtree
            WHERE (is_deleted = FALSE OR $4)
            ORDER BY depth ASC, (kind = 'folder') DESC, lower(name) ASC
            "#,
        )
        .bind(user_id)
        .bind(root_id)
        .bind(max_depth)
        .bind(include_deleted)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Self::rows_to_items(rows)
    }

    async fn get_item(
        &self,
        user_id: &Uuid,
        id: &Uuid,
        kind: Option<ItemKind>,
    ) -> ItemRepositoryResult<Option<Item>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM storage.items
            WHERE user_id = $1 AND id = $2
              AND ($3::varchar IS NULL OR kind = $3)
            "#
        ))
        .bind(user_id)
        .bind(id)
        .bind(kind.map(|k| k.as_str()))
        .fetch_optional(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn get_item_by_name(
        &self,
        user_id: &Uuid,
        name: &str,
        parent_id: Option<&Uuid>,
        include_deleted: bool,
    ) -> ItemRepositoryResult<Option<Item>> {
        // A file and a folder may share a name at one level; prefer the
        // folder so path resolution keeps descending.
        let row = sqlx::query(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM storage.items
            WHERE user_id = $1
              AND lower(name) = lower($2)
              AND parent_id IS NOT DISTINCT FROM $3
              AND (is_deleted = FALSE OR $4)
            ORDER BY (kind = 'folder') DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(name)
        .bind(parent_id.copied())
        .bind(include_deleted)
        .fetch_optional(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn paged_listing(
        &self,
        user_id: &Uuid,
        parent_id: Option<&Uuid>,
        offset: i64,
        limit: i64,
        sort_by: SortKey,
        sort_dir: SortDirection,
        scope: ListingScope,
    ) -> ItemRepositoryResult<(Vec<Item>, i64)> {
        let sort_column = match sort_by {
            SortKey::Name => "lower(name)",
            SortKey::Size => "file_size",
            SortKey::Modified => "updated_at",
        };
        let direction = match sort_dir {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };

        // The trash view is flat: only roots of deleted subtrees, with
        // the parent filter not applicable.
        let (total, rows) = match scope {
            ListingScope::Live => {
                let predicate =
                    "user_id = $1 AND is_deleted = FALSE AND parent_id IS NOT DISTINCT FROM $2";

                let total: i64 = sqlx::query_scalar(&format!(
                    "SELECT COUNT(*) FROM storage.items WHERE {predicate}"
                ))
                .bind(user_id)
                .bind(parent_id.copied())
                .fetch_one(&*self.pool)
                .await
                .map_err(Self::map_sqlx_error)?;

                let rows = sqlx::query(&format!(
                    r#"
                    SELECT {ITEM_COLUMNS}
                    FROM storage.items
                    WHERE {predicate}
                    ORDER BY (kind = 'folder') DESC, {sort_column} {direction}
                    OFFSET $3 LIMIT $4
                    "#
                ))
                .bind(user_id)
                .bind(parent_id.copied())
                .bind(offset)
                .bind(limit)
                .fetch_all(&*self.pool)
                .await
                .map_err(Self::map_sqlx_error)?;
                (total, rows)
            }
            ListingScope::Trash => {
                let predicate = "user_id = $1 AND is_deleted = TRUE \
                     AND (parent_id IS NULL OR EXISTS ( \
                         SELECT 1 FROM storage.items p \
                         WHERE p.id = storage.items.parent_id AND p.is_deleted = FALSE))";

                let total: i64 = sqlx::query_scalar(&format!(
                    "SELECT COUNT(*) FROM storage.items WHERE {predicate}"
                ))
                .bind(user_id)
                .fetch_one(&*self.pool)
                .await
                .map_err(Self::map_sqlx_error)?;

                let rows = sqlx::query(&format!(
                    r#"
                    SELECT {ITEM_COLUMNS}
                    FROM storage.items
                    WHERE {predicate}
                    ORDER BY (kind = 'folder') DESC, {sort_column} {direction}
                    OFFSET $2 LIMIT $3
                    "#
                ))
                .bind(user_id)
                .bind(offset)
                .bind(limit)
                .fetch_all(&*self.pool)
                .await
                .map_err(Self::map_sqlx_error)?;
                (total, rows)
            }
        };

        Ok((Self::rows_to_items(rows)?, total))
    }

    async fn trash_roots(&self, user_id: &Uuid) -> ItemRepositoryResult<Vec<Item>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM storage.items i
            WHERE i.user_id = $1
              AND i.is_deleted = TRUE
              AND (i.parent_id IS NULL OR EXISTS (
                  SELECT 1 FROM storage.items p
                  WHERE p.id = i.parent_id AND p.is_deleted = FALSE))
            ORDER BY i.deleted_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Self::rows_to_items(rows)
    }

    async fn name_exists(
        &self,
        user_id: &Uuid,
        name: &str,
        kind: ItemKind,
        parent_id: Option<&Uuid>,
        exclude_id: Option<&Uuid>,
        include_deleted: bool,
    ) -> ItemRepositoryResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM storage.items
                WHERE user_id = $1
                  AND lower(name) = lower($2)
                  AND kind = $3
                  AND parent_id IS NOT DISTINCT FROM $4
                  AND ($5::uuid IS NULL OR id <> $5)
                  AND (is_deleted = FALSE OR $6)
            )
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(kind.as_str())
        .bind(parent_id.copied())
        .bind(exclude_id.copied())
        .bind(include_deleted)
        .fetch_one(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(exists)
    }

    async fn add_item(&self, item: &Item) -> ItemRepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO storage.items (
                id, user_id, parent_id, name, kind, file_path, file_size,
                mime_type, is_deleted, deleted_at, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12
            )
            "#,
        )
        .bind(item.id())
        .bind(item.user_id())
        .bind(item.parent_id().copied())
        .bind(item.name())
        .bind(item.kind().as_str())
        .bind(item.file_path())
        .bind(item.file_size())
        .bind(item.mime_type())
        .bind(item.is_deleted())
        .bind(item.deleted_at())
        .bind(item.created_at())
        .bind(item.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(())
    }

    async fn apply_batch(&self, items: &[Item]) -> ItemRepositoryResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(Self::map_sqlx_error)?;

        for item in items {
            let result = sqlx::query(
                r#"
                UPDATE storage.items SET
                    parent_id = $3,
                    name = $4,
                    file_path = $5,
                    file_size = $6,
                    mime_type = $7,
                    is_deleted = $8,
                    deleted_at = $9,
                    updated_at = $10
                WHERE user_id = $1 AND id = $2
                "#,
            )
            .bind(item.user_id())
            .bind(item.id())
            .bind(item.parent_id().copied())
            .bind(item.name())
            .bind(item.file_path())
            .bind(item.file_size())
            .bind(item.mime_type())
            .bind(item.is_deleted())
            .bind(item.deleted_at())
            .bind(item.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(Self::map_sqlx_error)?;

            if result.rows_affected() != 1 {
                // Dropping the transaction rolls the whole batch back
                return Err(ItemRepositoryError::NotFound(format!(
                    "Item {} vanished during batch update",
                    item.id()
                )));
            }
        }

        tx.commit().await.map_err(Self::map_sqlx_error)?;
        Ok(())
    }

    async fn delete_permanently(&self, user_id: &Uuid, id: &Uuid) -> ItemRepositoryResult<()> {
        let result = sqlx::query("DELETE FROM storage.items WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(Self::map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(ItemRepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn expired_items(&self, cutoff: DateTime<Utc>) -> ItemRepositoryResult<Vec<Item>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM storage.items i
            WHERE i.is_deleted = TRUE
              AND i.deleted_at < $1
              AND (i.parent_id IS NULL OR EXISTS (
                  SELECT 1 FROM storage.items p
                  WHERE p.id = i.parent_id AND p.is_deleted = FALSE))
            ORDER BY i.deleted_at ASC
            "#
        ))
        .bind(cutoff)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Self::rows_to_items(rows)
    }
}
