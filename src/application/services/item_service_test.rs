use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;
use uuid::Uuid;

use crate::application::dtos::pagination::PaginationRequestDto;
use crate::application::ports::archive_ports::ArchiveUseCase;
use crate::application::ports::item_ports::{ItemUseCase, UploadStream};
use crate::application::ports::trash_ports::TrashUseCase;
use crate::application::services::archive_service::ArchiveService;
use crate::application::services::item_service::ItemService;
use crate::application::services::trash_service::TrashService;
use crate::common::config::{ArchiveConfig, TrashConfig};
use crate::common::errors::ErrorKind;
use crate::domain::entities::item::{Item, ItemKind};
use crate::domain::repositories::item_repository::{
    ItemRepository, ItemRepositoryError, ItemRepositoryResult, ListingScope, SortDirection,
    SortKey,
};
use crate::domain::services::path_service::PathService;
use crate::infrastructure::services::filesystem_service::FilesystemService;
use crate::infrastructure::services::user_locks::UserLockRegistry;

// In-memory repository standing in for Postgres
struct MockItemRepository {
    items: Mutex<HashMap<Uuid, Item>>,
}

impl MockItemRepository {
    fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, id: &Uuid) -> Option<Item> {
        self.items.lock().unwrap().get(id).cloned()
    }

    fn count(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    fn sort_listing(items: &mut [Item]) {
        items.sort_by(|a, b| {
            b.is_folder()
                .cmp(&a.is_folder())
                .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
        });
    }

    fn is_trash_root(items: &HashMap<Uuid, Item>, item: &Item) -> bool {
        item.is_deleted()
            && match item.parent_id() {
                None => true,
                Some(pid) => items.get(pid).map_or(true, |p| !p.is_deleted()),
            }
    }
}

#[async_trait]
impl ItemRepository for MockItemRepository {
    async fn direct_children(
        &self,
        user_id: &Uuid,
        parent_id: Option<&Uuid>,
        kind: Option<ItemKind>,
        include_deleted: bool,
    ) -> ItemRepositoryResult<Vec<Item>> {
        let items = self.items.lock().unwrap();
        let mut children: Vec<Item> = items
            .values()
            .filter(|i| i.user_id() == user_id)
            .filter(|i| i.parent_id() == parent_id)
            .filter(|i| kind.map_or(true, |k| i.kind() == k))
            .filter(|i| include_deleted || !i.is_deleted())
            .cloned()
            .collect();
        Self::sort_listing(&mut children);
        Ok(children)
    }

    async fn all_descendants(
        &self,
        user_id: &Uuid,
        root_id: &Uuid,
        max_depth: i32,
        include_deleted: bool,
    ) -> ItemRepositoryResult<Vec<Item>> {
        let items = self.items.lock().unwrap();
        let mut result = Vec::new();
        let mut frontier = vec![*root_id];
        let mut depth = 0;

        while !frontier.is_empty() && depth < max_depth {
            depth += 1;
            let mut level: Vec<Item> = items
                .values()
                .filter(|i| i.user_id() == user_id)
                .filter(|i| i.parent_id().map_or(false, |p| frontier.contains(p)))
                .filter(|i| include_deleted || !i.is_deleted())
                .cloned()
                .collect();
            Self::sort_listing(&mut level);
            frontier = level.iter().map(|i| *i.id()).collect();
            result.extend(level);
        }
        Ok(result)
    }

    async fn get_item(
        &self,
        user_id: &Uuid,
        id: &Uuid,
        kind: Option<ItemKind>,
    ) -> ItemRepositoryResult<Option<Item>> {
        let items = self.items.lock().unwrap();
        Ok(items
            .get(id)
            .filter(|i| i.user_id() == user_id)
            .filter(|i| kind.map_or(true, |k| i.kind() == k))
            .cloned())
    }

    async fn get_item_by_name(
        &self,
        user_id: &Uuid,
        name: &str,
        parent_id: Option<&Uuid>,
        include_deleted: bool,
    ) -> ItemRepositoryResult<Option<Item>> {
        let items = self.items.lock().unwrap();
        let mut matches: Vec<&Item> = items
            .values()
            .filter(|i| i.user_id() == user_id)
            .filter(|i| i.parent_id() == parent_id)
            .filter(|i| i.name().eq_ignore_ascii_case(name))
            .filter(|i| include_deleted || !i.is_deleted())
            .collect();
        matches.sort_by_key(|i| !i.is_folder());
        Ok(matches.first().map(|i| (*i).clone()))
    }

    async fn paged_listing(
        &self,
        user_id: &Uuid,
        parent_id: Option<&Uuid>,
        offset: i64,
        limit: i64,
        _sort_by: SortKey,
        _sort_dir: SortDirection,
        scope: ListingScope,
    ) -> ItemRepositoryResult<(Vec<Item>, i64)> {
        let items = self.items.lock().unwrap();
        let mut filtered: Vec<Item> = items
            .values()
            .filter(|i| i.user_id() == user_id)
            .filter(|i| match scope {
                ListingScope::Live => !i.is_deleted() && i.parent_id() == parent_id,
                ListingScope::Trash => Self::is_trash_root(&items, i),
            })
            .cloned()
            .collect();
        Self::sort_listing(&mut filtered);

        let total = filtered.len() as i64;
        let page = filtered
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn trash_roots(&self, user_id: &Uuid) -> ItemRepositoryResult<Vec<Item>> {
        let items = self.items.lock().unwrap();
        Ok(items
            .values()
            .filter(|i| i.user_id() == user_id)
            .filter(|i| Self::is_trash_root(&items, i))
            .cloned()
            .collect())
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
        let items = self.items.lock().unwrap();
        Ok(items.values().any(|i| {
            i.user_id() == user_id
                && i.kind() == kind
                && i.parent_id() == parent_id
                && i.name().eq_ignore_ascii_case(name)
                && exclude_id.map_or(true, |ex| i.id() != ex)
                && (include_deleted || !i.is_deleted())
        }))
    }

    async fn add_item(&self, item: &Item) -> ItemRepositoryResult<()> {
        let mut items = self.items.lock().unwrap();
        items.insert(*item.id(), item.clone());
        Ok(())
    }

    async fn apply_batch(&self, batch: &[Item]) -> ItemRepositoryResult<()> {
        let mut items = self.items.lock().unwrap();
        // All-or-nothing: verify before touching anything
        for item in batch {
            if !items.contains_key(item.id()) {
                return Err(ItemRepositoryError::NotFound(item.id().to_string()));
            }
        }
        for item in batch {
            items.insert(*item.id(), item.clone());
        }
        Ok(())
    }

    async fn delete_permanently(&self, user_id: &Uuid, id: &Uuid) -> ItemRepositoryResult<()> {
        let mut items = self.items.lock().unwrap();
        if !items.get(id).map_or(false, |i| i.user_id() == user_id) {
            return Err(ItemRepositoryError::NotFound(id.to_string()));
        }

        // Emulate the FK cascade over the subtree
        let mut doomed = vec![*id];
        let mut frontier = vec![*id];
        while !frontier.is_empty() {
            let next: Vec<Uuid> = items
                .values()
                .filter(|i| i.parent_id().map_or(false, |p| frontier.contains(p)))
                .map(|i| *i.id())
                .collect();
            doomed.extend(&next);
            frontier = next;
        }
        for id in doomed {
            items.remove(&id);
        }
        Ok(())
    }

    async fn expired_items(&self, cutoff: DateTime<Utc>) -> ItemRepositoryResult<Vec<Item>> {
        let items = self.items.lock().unwrap();
        Ok(items
            .values()
            .filter(|i| Self::is_trash_root(&items, i))
            .filter(|i| i.deleted_at().map_or(false, |at| at < cutoff))
            .cloned()
            .collect())
    }
}

struct Fixture {
    dir: tempfile::TempDir,
    repo: Arc<MockItemRepository>,
    items: ItemService,
    trash: TrashService,
    user: Uuid,
}

fn setup() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(MockItemRepository::new());
    let paths = Arc::new(PathService::new(PathBuf::from(dir.path())));
    let filesystem = Arc::new(FilesystemService::new(paths));
    let locks = Arc::new(UserLockRegistry::new());

    let items = ItemService::new(repo.clone(), filesystem.clone(), locks.clone());
    let trash = TrashService::new(
        repo.clone(),
        filesystem,
        locks,
        TrashConfig {
            retention_days: 30,
            cleanup_interval_hours: 6,
        },
    );

    Fixture {
        dir,
        repo,
        items,
        trash,
        user: Uuid::new_v4(),
    }
}

fn bytes(content: &str) -> UploadStream {
    Box::new(std::io::Cursor::new(content.as_bytes().to_vec()))
}

impl Fixture {
    fn archive(&self, config: ArchiveConfig) -> ArchiveService {
        let paths = Arc::new(PathService::new(PathBuf::from(self.dir.path())));
        ArchiveService::new(self.repo.clone(), paths, config)
    }

    fn disk_path(&self, relative: &str) -> PathBuf {
        self.dir
            .path()
            .join("users")
            .join(format!("user-{}", self.user))
            .join(relative)
    }

    /// Builds the running example tree: Docs/a.txt and Docs/Sub/b.txt.
    /// Returns (docs_id, sub_id, b_id).
    async fn build_docs_tree(&self) -> (Uuid, Uuid, Uuid) {
        let docs = self
            .items
            .create_folder(self.user, None, "Docs".to_string())
            .await
            .unwrap();
        let sub = self
            .items
            .create_folder(self.user, Some(docs.id), "Sub".to_string())
            .await
            .unwrap();
        self.items
            .upload_file(self.user, Some(docs.id), "a.txt".to_string(), None, bytes("aaa"))
            .await
            .unwrap();
        let b = self
            .items
            .upload_file(self.user, Some(sub.id), "b.txt".to_string(), None, bytes("bbb"))
            .await
            .unwrap();
        (docs.id, sub.id, b.id)
    }
}

#[tokio::test]
async fn test_create_folder_persists_row_and_directory() {
    let fx = setup();

    let dto = fx
        .items
        .create_folder(fx.user, None, "Docs".to_string())
        .await
        .unwrap();

    let stored = fx.repo.get(&dto.id).unwrap();
    assert_eq!(stored.name(), "Docs");
    assert!(stored.is_folder());
    assert!(fx.disk_path("Docs").is_dir());
}

#[tokio::test]
async fn test_create_folder_rejects_duplicate_name() {
    let fx = setup();
    fx.items
        .create_folder(fx.user, None, "Docs".to_string())
        .await
        .unwrap();

    let err = fx
        .items
        .create_folder(fx.user, None, "docs".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);
}

#[tokio::test]
async fn test_upload_collision_gets_numbered_name() {
    let fx = setup();

    let first = fx
        .items
        .upload_file(fx.user, None, "a.txt".to_string(), None, bytes("one"))
        .await
        .unwrap();
    let second = fx
        .items
        .upload_file(fx.user, None, "a.txt".to_string(), None, bytes("two"))
        .await
        .unwrap();

    assert_eq!(first.name, "a.txt");
    assert_eq!(second.name, "a(1).txt");
    assert!(fx.disk_path("a.txt").is_file());
    assert!(fx.disk_path("a(1).txt").is_file());
    assert_eq!(second.file_size, Some(3));
}

#[tokio::test]
async fn test_upload_guesses_mime_type() {
    let fx = setup();
    let dto = fx
        .items
        .upload_file(fx.user, None, "notes.txt".to_string(), None, bytes("x"))
        .await
        .unwrap();
    assert_eq!(dto.mime_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn test_upload_into_missing_parent_fails() {
    let fx = setup();
    let err = fx
        .items
        .upload_file(
            fx.user,
            Some(Uuid::new_v4()),
            "a.txt".to_string(),
            None,
            bytes("x"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_rename_folder_cascades_paths_and_moves_directory() {
    let fx = setup();
    let (docs_id, _, b_id) = fx.build_docs_tree().await;

    fx.items
        .rename_item(fx.user, docs_id, "Documents".to_string())
        .await
        .unwrap();

    let b = fx.repo.get(&b_id).unwrap();
    assert_eq!(b.file_path(), Some("Documents/Sub/b.txt"));
    assert!(fx.disk_path("Documents/Sub/b.txt").is_file());
    assert!(!fx.disk_path("Docs").exists());
}

#[tokio::test]
async fn test_rename_file_updates_sibling_path() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;
    let a = fx
        .items
        .list_children(fx.user, Some(docs_id))
        .await
        .unwrap()
        .into_iter()
        .find(|i| i.name == "a.txt")
        .unwrap();

    let renamed = fx
        .items
        .rename_item(fx.user, a.id, "renamed.txt".to_string())
        .await
        .unwrap();

    assert_eq!(renamed.file_path.as_deref(), Some("Docs/renamed.txt"));
    assert!(fx.disk_path("Docs/renamed.txt").is_file());
    assert!(!fx.disk_path("Docs/a.txt").exists());
}

#[tokio::test]
async fn test_move_folder_remaps_subtree() {
    let fx = setup();
    let (docs_id, sub_id, b_id) = fx.build_docs_tree().await;
    let archive = fx
        .items
        .create_folder(fx.user, None, "Archive".to_string())
        .await
        .unwrap();

    fx.items
        .move_item(fx.user, sub_id, Some(archive.id))
        .await
        .unwrap();

    let b = fx.repo.get(&b_id).unwrap();
    assert_eq!(b.file_path(), Some("Archive/Sub/b.txt"));
    assert!(fx.disk_path("Archive/Sub/b.txt").is_file());

    let docs_children = fx.items.list_children(fx.user, Some(docs_id)).await.unwrap();
    assert!(docs_children.iter().all(|i| i.name != "Sub"));
}

#[tokio::test]
async fn test_move_into_own_subtree_is_rejected() {
    let fx = setup();
    let (docs_id, sub_id, _) = fx.build_docs_tree().await;

    let err = fx
        .items
        .move_item(fx.user, docs_id, Some(sub_id))
        .await
        .unwrap_err();
    // Planner rejection surfaces through the transaction-free validation path
    assert_eq!(err.kind, ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_move_rejects_destination_name_conflict() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;
    let archive = fx
        .items
        .create_folder(fx.user, None, "Archive".to_string())
        .await
        .unwrap();
    fx.items
        .create_folder(fx.user, Some(archive.id), "Docs".to_string())
        .await
        .unwrap();

    let err = fx
        .items
        .move_item(fx.user, docs_id, Some(archive.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);
}

#[tokio::test]
async fn test_soft_delete_marks_subtree_and_keeps_bytes() {
    let fx = setup();
    let (docs_id, sub_id, b_id) = fx.build_docs_tree().await;

    fx.items.soft_delete_item(fx.user, docs_id).await.unwrap();

    assert!(fx.repo.get(&docs_id).unwrap().is_deleted());
    assert!(fx.repo.get(&sub_id).unwrap().is_deleted());
    assert!(fx.repo.get(&b_id).unwrap().is_deleted());
    // Bytes survive until permanent deletion
    assert!(fx.disk_path("Docs/Sub/b.txt").is_file());

    let root = fx.items.list_children(fx.user, None).await.unwrap();
    assert!(root.iter().all(|i| i.id != docs_id));
}

#[tokio::test]
async fn test_trash_lists_only_subtree_roots() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;

    fx.items.soft_delete_item(fx.user, docs_id).await.unwrap();

    let trash = fx.trash.list_trash(fx.user).await.unwrap();
    assert_eq!(trash.len(), 1);
    assert_eq!(trash[0].id, docs_id);
    assert!(trash[0].days_until_deletion > 0);
}

#[tokio::test]
async fn test_restore_blocked_by_deleted_parent() {
    let fx = setup();
    let (docs_id, sub_id, _) = fx.build_docs_tree().await;
    fx.items.soft_delete_item(fx.user, docs_id).await.unwrap();

    let err = fx.trash.restore_item(fx.user, sub_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ParentDeleted);
}

#[tokio::test]
async fn test_restore_round_trip() {
    let fx = setup();
    let (docs_id, sub_id, b_id) = fx.build_docs_tree().await;
    fx.items.soft_delete_item(fx.user, docs_id).await.unwrap();

    fx.trash.restore_item(fx.user, docs_id).await.unwrap();

    assert!(!fx.repo.get(&docs_id).unwrap().is_deleted());
    assert!(!fx.repo.get(&sub_id).unwrap().is_deleted());
    assert!(!fx.repo.get(&b_id).unwrap().is_deleted());
    assert!(fx.trash.list_trash(fx.user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_restore_blocked_by_name_squatter() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;
    fx.items.soft_delete_item(fx.user, docs_id).await.unwrap();

    // A new folder takes the old name while Docs sits in trash
    fx.items
        .create_folder(fx.user, None, "Docs".to_string())
        .await
        .unwrap();

    let err = fx.trash.restore_item(fx.user, docs_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);
}

#[tokio::test]
async fn test_permanent_delete_removes_rows_and_disk() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;
    let before = fx.repo.count();
    fx.items.soft_delete_item(fx.user, docs_id).await.unwrap();

    fx.trash.delete_permanently(fx.user, docs_id).await.unwrap();

    assert_eq!(fx.repo.count(), before - 4);
    assert!(!fx.disk_path("Docs").exists());
}

#[tokio::test]
async fn test_permanent_delete_requires_trash_membership() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;

    let err = fx
        .trash
        .delete_permanently(fx.user, docs_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_empty_trash_purges_every_root() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;
    let loose = fx
        .items
        .upload_file(fx.user, None, "loose.txt".to_string(), None, bytes("x"))
        .await
        .unwrap();
    fx.items.soft_delete_item(fx.user, docs_id).await.unwrap();
    fx.items.soft_delete_item(fx.user, loose.id).await.unwrap();

    fx.trash.empty_trash(fx.user).await.unwrap();

    assert!(fx.trash.list_trash(fx.user).await.unwrap().is_empty());
    assert!(!fx.disk_path("Docs").exists());
    assert!(!fx.disk_path("loose.txt").exists());
}

#[tokio::test]
async fn test_empty_trash_continues_past_a_stuck_root() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;
    fx.items.soft_delete_item(fx.user, docs_id).await.unwrap();

    // A deleted folder whose parent row is gone cannot be located on
    // disk; its purge fails while the other roots still drain
    let orphan = Item::new_folder(fx.user, "Orphan".to_string(), Some(Uuid::new_v4()))
        .unwrap()
        .mark_deleted(Utc::now());
    fx.repo.add_item(&orphan).await.unwrap();

    fx.trash.empty_trash(fx.user).await.unwrap();

    assert!(fx.repo.get(&docs_id).is_none());
    assert!(fx.repo.get(orphan.id()).is_some());
    assert!(!fx.disk_path("Docs").exists());
}

#[tokio::test]
async fn test_purge_expired_respects_retention() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;
    fx.items.soft_delete_item(fx.user, docs_id).await.unwrap();

    // Freshly deleted: nothing is old enough yet
    assert_eq!(fx.trash.purge_expired().await.unwrap(), 0);

    // Backdate the deletion beyond the retention window
    let stale = fx
        .repo
        .get(&docs_id)
        .unwrap()
        .mark_deleted(Utc::now() - Duration::days(45));
    fx.repo.add_item(&stale).await.unwrap();

    assert_eq!(fx.trash.purge_expired().await.unwrap(), 1);
    assert!(fx.repo.get(&docs_id).is_none());
}

#[tokio::test]
async fn test_get_item_by_path_walks_segments() {
    let fx = setup();
    let (_, _, b_id) = fx.build_docs_tree().await;

    let b = fx
        .items
        .get_item_by_path(fx.user, "Docs/Sub/b.txt")
        .await
        .unwrap();
    assert_eq!(b.id, b_id);

    // Segment matching is case-insensitive
    let b = fx
        .items
        .get_item_by_path(fx.user, "docs/sub/B.TXT")
        .await
        .unwrap();
    assert_eq!(b.id, b_id);

    let err = fx
        .items
        .get_item_by_path(fx.user, "Docs/missing.txt")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // A file cannot appear mid-path
    let err = fx
        .items
        .get_item_by_path(fx.user, "Docs/a.txt/deeper")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_list_trash_paged_reports_totals() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;
    let loose = fx
        .items
        .upload_file(fx.user, None, "loose.txt".to_string(), None, bytes("x"))
        .await
        .unwrap();
    fx.items.soft_delete_item(fx.user, docs_id).await.unwrap();
    fx.items.soft_delete_item(fx.user, loose.id).await.unwrap();

    let page = fx
        .trash
        .list_trash_paged(fx.user, PaginationRequestDto::default())
        .await
        .unwrap();

    // Two roots; cascaded descendants never appear individually
    assert_eq!(page.pagination.total_items, 2);
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn test_archive_limits_fail_before_any_byte_is_produced() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;

    let tight = fx.archive(ArchiveConfig {
        max_total_bytes: 1,
        ..ArchiveConfig::default()
    });
    let err = tight.stream_folder(fx.user, docs_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ArchiveTooLarge);

    let narrow = fx.archive(ArchiveConfig {
        max_entries: 1,
        ..ArchiveConfig::default()
    });
    let err = narrow.stream_folder(fx.user, docs_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TooManyFiles);
}

#[tokio::test]
async fn test_archive_preserves_hierarchy_and_skips_missing_files() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;

    // a.txt keeps its row but loses its bytes
    std::fs::remove_file(fx.disk_path("Docs/a.txt")).unwrap();

    let download = fx
        .archive(ArchiveConfig::default())
        .stream_folder(fx.user, docs_id)
        .await
        .unwrap();
    assert_eq!(download.suggested_name, "Docs.zip");

    let mut stream = download.stream;
    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        bytes.extend_from_slice(&chunk.unwrap());
    }

    let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"Sub/"));
    assert!(names.contains(&"Sub/b.txt"));
    assert!(!names.iter().any(|n| n.contains("a.txt")));
}

#[tokio::test]
async fn test_archive_selection_mixes_files_and_folders() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;
    let loose = fx
        .items
        .upload_file(fx.user, None, "loose.txt".to_string(), None, bytes("x"))
        .await
        .unwrap();

    let download = fx
        .archive(ArchiveConfig::default())
        .stream_selection(fx.user, vec![docs_id, loose.id])
        .await
        .unwrap();

    let mut stream = download.stream;
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk.unwrap());
    }

    let archive = zip::ZipArchive::new(std::io::Cursor::new(buf)).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    // The selected folder expands under its own top-level directory,
    // the selected file sits at the archive root
    assert!(names.contains(&"Docs/"));
    assert!(names.contains(&"Docs/Sub/b.txt"));
    assert!(names.contains(&"loose.txt"));
}

#[tokio::test]
async fn test_tenant_isolation_between_users() {
    let fx = setup();
    let (docs_id, _, _) = fx.build_docs_tree().await;
    let stranger = Uuid::new_v4();

    let err = fx
        .items
        .rename_item(stranger, docs_id, "Stolen".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    assert!(fx.items.list_children(stranger, None).await.unwrap().is_empty());
}
