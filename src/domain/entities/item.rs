use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error in the creation or manipulation of item entities
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("Invalid item name: {0}")]
    InvalidName(String),

    #[error("Invalid state transition: {0}")]
    InvalidState(String),
}

/// Result type for item entity operations
pub type ItemResult<T> = Result<T, ItemError>;

/// Discriminates file and folder nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::File => "file",
            ItemKind::Folder => "folder",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "file" => Some(ItemKind::File),
            "folder" => Some(ItemKind::Folder),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in a user's hierarchy: either a file or a folder.
///
/// A folder never stores `file_path`/`file_size`/`mime_type`; its location
/// is derived from the name hierarchy. A file's `file_path` is relative to
/// the owning user's root and never contains that root prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Unique identifier
    id: Uuid,

    /// Owning user, immutable for the item's lifetime
    user_id: Uuid,

    /// Display name, never a path
    name: String,

    kind: ItemKind,

    /// Parent folder id (None for root-level items)
    parent_id: Option<Uuid>,

    /// User-root-relative disk path, files only
    file_path: Option<String>,

    /// Size in bytes, files only
    file_size: Option<i64>,

    /// MIME type, files only
    mime_type: Option<String>,

    /// Soft-delete flag
    is_deleted: bool,

    deleted_at: Option<DateTime<Utc>>,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

fn validate_name(name: &str) -> ItemResult<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return Err(ItemError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl Item {
    /// Creates a new file node with validation
    pub fn new_file(
        user_id: Uuid,
        name: String,
        parent_id: Option<Uuid>,
        file_path: String,
        file_size: i64,
        mime_type: String,
    ) -> ItemResult<Self> {
        validate_name(&name)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            kind: ItemKind::File,
            parent_id,
            file_path: Some(file_path),
            file_size: Some(file_size),
            mime_type: Some(mime_type),
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates a new folder node with validation
    pub fn new_folder(user_id: Uuid, name: String, parent_id: Option<Uuid>) -> ItemResult<Self> {
        validate_name(&name)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            kind: ItemKind::Folder,
            parent_id,
            file_path: None,
            file_size: None,
            mime_type: None,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs an item from stored data, bypassing validation
    #[allow(clippy::too_many_arguments)]
    pub fn from_row(
        id: Uuid,
        user_id: Uuid,
        name: String,
        kind: ItemKind,
        parent_id: Option<Uuid>,
        file_path: Option<String>,
        file_size: Option<i64>,
        mime_type: Option<String>,
        is_deleted: bool,
        deleted_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            name,
            kind,
            parent_id,
            file_path,
            file_size,
            mime_type,
            is_deleted,
            deleted_at,
            created_at,
            updated_at,
        }
    }

    // Getters
    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn user_id(&self) -> &Uuid {
        &self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }

    pub fn parent_id(&self) -> Option<&Uuid> {
        self.parent_id.as_ref()
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn file_size(&self) -> Option<i64> {
        self.file_size
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Methods producing new versions of the item (immutable updates)

    /// New version with updated name and, for files, the sibling disk path
    pub fn with_name(&self, new_name: String, new_file_path: Option<String>) -> ItemResult<Self> {
        validate_name(&new_name)?;

        Ok(Self {
            name: new_name,
            file_path: match self.kind {
                ItemKind::File => new_file_path.or_else(|| self.file_path.clone()),
                ItemKind::Folder => None,
            },
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// New version with a rewritten disk path (folder rename/move cascade)
    pub fn with_file_path(&self, new_file_path: String) -> Self {
        Self {
            file_path: Some(new_file_path),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// New version under a different parent
    pub fn with_parent(&self, parent_id: Option<Uuid>, new_file_path: Option<String>) -> Self {
        Self {
            parent_id,
            file_path: match self.kind {
                ItemKind::File => new_file_path.or_else(|| self.file_path.clone()),
                ItemKind::Folder => None,
            },
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// New soft-deleted version
    pub fn mark_deleted(&self, now: DateTime<Utc>) -> Self {
        Self {
            is_deleted: true,
            deleted_at: Some(now),
            updated_at: now,
            ..self.clone()
        }
    }

    /// New restored version. Restoring an already-live item is a no-op
    /// apart from the timestamp refresh.
    pub fn restored(&self, now: DateTime<Utc>) -> Self {
        Self {
            is_deleted: false,
            deleted_at: None,
            updated_at: now,
            ..self.clone()
        }
    }
}
