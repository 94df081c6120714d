use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;

/// Error kinds shared across the whole storage core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entity absent, wrong owner or wrong type filter
    NotFound,
    /// Name collides with a live sibling at the target location
    AlreadyExists,
    /// Invalid input or failed validation
    InvalidInput,
    /// Resolved filesystem path leaves the user's sandbox
    PathEscape,
    /// Restore blocked because an ancestor is still deleted
    ParentDeleted,
    /// Archive pre-flight: cumulative size over the limit
    ArchiveTooLarge,
    /// Archive pre-flight: too many entries in the selection
    TooManyFiles,
    /// Physical filesystem operation failed
    Io,
    /// Internal error (DB failure mid-transaction, etc.)
    Internal,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ErrorKind::NotFound => write!(f, "Not Found"),
            ErrorKind::AlreadyExists => write!(f, "Already Exists"),
            ErrorKind::InvalidInput => write!(f, "Invalid Input"),
            ErrorKind::PathEscape => write!(f, "Path Escape"),
            ErrorKind::ParentDeleted => write!(f, "Parent Deleted"),
            ErrorKind::ArchiveTooLarge => write!(f, "Archive Too Large"),
            ErrorKind::TooManyFiles => write!(f, "Too Many Files"),
            ErrorKind::Io => write!(f, "IO Error"),
            ErrorKind::Internal => write!(f, "Internal Error"),
        }
    }
}

/// Base domain error carrying detailed context
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct DomainError {
    /// Error kind
    pub kind: ErrorKind,
    /// Affected entity type (e.g. "Item", "User")
    pub entity_type: &'static str,
    /// Entity identifier when available
    pub entity_id: Option<String>,
    /// Human-readable message
    pub message: String,
    /// Source error (optional)
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

/// Result alias used throughout the application layer
pub type Result<T> = std::result::Result<T, DomainError>;

impl DomainError {
    pub fn new<S: Into<String>>(
        kind: ErrorKind,
        entity_type: &'static str,
        message: S,
    ) -> Self {
        Self {
            kind,
            entity_type,
            entity_id: None,
            message: message.into(),
            source: None,
        }
    }

    /// Entity not found
    pub fn not_found<S: Into<String>>(entity_type: &'static str, entity_id: S) -> Self {
        let id = entity_id.into();
        Self {
            kind: ErrorKind::NotFound,
            entity_type,
            entity_id: Some(id.clone()),
            message: format!("{} not found: {}", entity_type, id),
            source: None,
        }
    }

    /// Name conflict at the target location
    pub fn already_exists<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self {
            kind: ErrorKind::AlreadyExists,
            entity_type,
            entity_id: None,
            message: message.into(),
            source: None,
        }
    }

    /// Validation failure
    pub fn validation_error<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            entity_type,
            entity_id: None,
            message: message.into(),
            source: None,
        }
    }

    /// Resolved path escaped the user root. Treated as a security
    /// violation, never retried.
    pub fn path_escape<S: Into<String>>(message: S) -> Self {
        Self {
            kind: ErrorKind::PathEscape,
            entity_type: "Path",
            entity_id: None,
            message: message.into(),
            source: None,
        }
    }

    /// Restore blocked by a still-deleted ancestor
    pub fn parent_deleted<S: Into<String>>(entity_id: S) -> Self {
        let id = entity_id.into();
        Self {
            kind: ErrorKind::ParentDeleted,
            entity_type: "Item",
            entity_id: Some(id.clone()),
            message: format!("Cannot restore {}: parent folder is still deleted", id),
            source: None,
        }
    }

    pub fn archive_too_large(total_bytes: u64, limit_bytes: u64) -> Self {
        Self {
            kind: ErrorKind::ArchiveTooLarge,
            entity_type: "Archive",
            entity_id: None,
            message: format!(
                "Selection totals {} bytes, archive limit is {} bytes",
                total_bytes, limit_bytes
            ),
            source: None,
        }
    }

    pub fn too_many_files(count: usize, limit: usize) -> Self {
        Self {
            kind: ErrorKind::TooManyFiles,
            entity_type: "Archive",
            entity_id: None,
            message: format!("Selection contains {} files, archive limit is {}", count, limit),
            source: None,
        }
    }

    /// Physical filesystem operation failed
    pub fn io_error<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self {
            kind: ErrorKind::Io,
            entity_type,
            entity_id: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_error<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self {
            kind: ErrorKind::Internal,
            entity_type,
            entity_id: None,
            message: message.into(),
            source: None,
        }
    }

    /// Sets the entity id
    pub fn with_id<S: Into<String>>(mut self, entity_id: S) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Sets the source error
    pub fn with_source<E: StdError + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

/// Trait to attach context to errors
pub trait ErrorContext<T, E> {
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;

    #[allow(dead_code)]
    fn with_error_kind(self, kind: ErrorKind, entity_type: &'static str) -> Result<T>;
}

impl<T, E: StdError + Send + Sync + 'static> ErrorContext<T, E> for std::result::Result<T, E> {
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| DomainError {
            kind: ErrorKind::Internal,
            entity_type: "Unknown",
            entity_id: None,
            message: context().into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_error_kind(self, kind: ErrorKind, entity_type: &'static str) -> Result<T> {
        self.map_err(|e| DomainError {
            kind,
            entity_type,
            entity_id: None,
            message: format!("{}", e),
            source: Some(Box::new(e)),
        })
    }
}

/// Macro to convert specific errors to DomainError
#[macro_export]
macro_rules! impl_from_error {
    ($error_type:ty, $entity_type:expr, $kind:expr) => {
        impl From<$error_type> for DomainError {
            fn from(err: $error_type) -> Self {
                DomainError {
                    kind: $kind,
                    entity_type: $entity_type,
                    entity_id: None,
                    message: format!("{}", err),
                    source: Some(Box::new(err)),
                }
            }
        }
    };
}

impl_from_error!(std::io::Error, "IO", ErrorKind::Io);
impl_from_error!(serde_json::Error, "Serialization", ErrorKind::Internal);
impl_from_error!(zip::result::ZipError, "Archive", ErrorKind::Internal);
impl_from_error!(tokio::task::JoinError, "Task", ErrorKind::Internal);
