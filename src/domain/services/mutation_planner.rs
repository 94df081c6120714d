use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::item::{Item, ItemError, ItemResult};
use crate::domain::services::path_service::StoragePath;

/// Pure planning of mutation batches: given an item (and for folders its
/// descendant set), computes the new state for rename, move, soft-delete
/// and restore without touching storage.
///
/// Every function returns the complete batch of rows that must change
/// together; persisting it atomically is the caller's job. Planners never
/// fail on valid input — conflict and ownership checks happen upstream.
pub struct MutationPlanner;

impl MutationPlanner {
    /// Plans a rename.
    ///
    /// For a file the disk path becomes a sibling under the same parent
    /// directory. For a folder every descendant file's path is rewritten
    /// by substituting the renamed-folder prefix; descendant folders
    /// carry no stored path and are left untouched.
    pub fn plan_rename(
        item: &Item,
        new_name: &str,
        old_folder_path: Option<&StoragePath>,
        descendants: &[Item],
    ) -> ItemResult<Vec<Item>> {
        if item.is_folder() {
            let old_path = old_folder_path.ok_or_else(|| {
                ItemError::InvalidState("folder rename requires the folder's current path".into())
            })?;
            let new_path = match old_path.parent() {
                Some(parent) => parent.join(new_name),
                None => StoragePath::from_string(new_name),
            };

            let mut batch = vec![item.with_name(new_name.to_string(), None)?];
            batch.extend(Self::remap_descendants(descendants, old_path, &new_path));
            Ok(batch)
        } else {
            let new_file_path = item
                .file_path()
                .map(StoragePath::from_string)
                .and_then(|p| p.parent())
                .map(|parent| parent.join(new_name))
                .unwrap_or_else(|| StoragePath::from_string(new_name));

            Ok(vec![item.with_name(
                new_name.to_string(),
                Some(new_file_path.to_relative_string()),
            )?])
        }
    }

    /// Plans a move to a different parent folder.
    ///
    /// Rejects a destination equal to, or inside, the moved item's own
    /// subtree: the tree must stay acyclic by construction.
    pub fn plan_move(
        item: &Item,
        new_parent_id: Option<Uuid>,
        old_path: &StoragePath,
        new_parent_path: &StoragePath,
        descendants: &[Item],
    ) -> ItemResult<Vec<Item>> {
        if let Some(target) = new_parent_id.as_ref() {
            if target == item.id() || descendants.iter().any(|d| d.id() == target) {
                return Err(ItemError::InvalidState(
                    "cannot move an item into its own subtree".into(),
                ));
            }
        }

        let new_path = new_parent_path.join(item.name());

        if item.is_folder() {
            let mut batch = vec![item.with_parent(new_parent_id, None)];
            batch.extend(Self::remap_descendants(descendants, old_path, &new_path));
            Ok(batch)
        } else {
            Ok(vec![item.with_parent(
                new_parent_id,
                Some(new_path.to_relative_string()),
            )])
        }
    }

    /// Plans a soft delete of the item and every supplied descendant as
    /// one batch. A file yields a singleton batch.
    pub fn plan_soft_delete(
        item: &Item,
        descendants: &[Item],
        now: DateTime<Utc>,
    ) -> Vec<Item> {
        std::iter::once(item)
            .chain(descendants.iter())
            .map(|i| i.mark_deleted(now))
            .collect()
    }

    /// Plans a restore of the supplied items. Idempotent: items that are
    /// already live come back unchanged except for the timestamp refresh.
    /// Callers must verify the parent chain is restorable first.
    pub fn plan_restore(items: &[Item], now: DateTime<Utc>) -> Vec<Item> {
        items.iter().map(|i| i.restored(now)).collect()
    }

    fn remap_descendants(
        descendants: &[Item],
        old_prefix: &StoragePath,
        new_prefix: &StoragePath,
    ) -> Vec<Item> {
        descendants
            .iter()
            .filter_map(|d| {
                let child_path = StoragePath::from_string(d.file_path()?);
                let remapped = child_path.remap_prefix(old_prefix, new_prefix)?;
                Some(d.with_file_path(remapped.to_relative_string()))
            })
            .collect()
    }
}
