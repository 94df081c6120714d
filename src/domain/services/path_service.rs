use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::common::errors::DomainError;

/// A storage path in the domain: an ordered list of name segments
/// relative to a user's root. Free of filesystem dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoragePath {
    segments: Vec<String>,
}

impl StoragePath {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// The empty (root) path
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Builds a path from a `/`-separated string
    pub fn from_string(path: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        Self { segments }
    }

    /// Appends a segment
    pub fn join(&self, segment: &str) -> Self {
        let mut new_segments = self.segments.clone();
        new_segments.push(segment.to_string());
        Self {
            segments: new_segments,
        }
    }

    /// Last segment (file or folder name)
    pub fn file_name(&self) -> Option<String> {
        self.segments.last().cloned()
    }

    /// Parent path, None at the root
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// User-root-relative representation stored in the database
    /// (`Docs/Sub/b.txt`), always `/`-separated, no leading slash.
    pub fn to_relative_string(&self) -> String {
        self.segments.join("/")
    }

    /// True when `prefix` is an initial segment run of this path
    pub fn starts_with(&self, prefix: &StoragePath) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// Rewrites this path after an ancestor folder moved from
    /// `old_prefix` to `new_prefix`, preserving everything below the
    /// moved folder. Returns None when this path is not under the old
    /// prefix.
    pub fn remap_prefix(
        &self,
        old_prefix: &StoragePath,
        new_prefix: &StoragePath,
    ) -> Option<StoragePath> {
        if !self.starts_with(old_prefix) {
            return None;
        }
        let mut segments = new_prefix.segments.clone();
        segments.extend_from_slice(&self.segments[old_prefix.segments.len()..]);
        Some(StoragePath::new(segments))
    }
}

impl std::fmt::Display for StoragePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            f.write_str("/")
        } else {
            write!(f, "/{}", self.segments.join("/"))
        }
    }
}

/// Domain service translating logical item identity into filesystem
/// locations, and rejecting escapes.
///
/// Two representations are deliberately kept apart: the *logical* path
/// (user-root relative, what the database stores) and the *physical*
/// path (absolute, what disk I/O uses). `StoragePath` is always logical;
/// only this service produces `PathBuf`s.
pub struct PathService {
    root_path: PathBuf,
}

impl PathService {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Deterministic sandbox root for a user
    pub fn user_root(&self, user_id: &Uuid) -> PathBuf {
        self.root_path.join("users").join(format!("user-{}", user_id))
    }

    /// Resolves a caller-supplied relative path against the user root,
    /// lexically collapsing `.` and `..`. Fails with `PathEscape` if the
    /// resolution would leave the sandbox. Must run before any syscall
    /// on an untrusted path.
    pub fn physical_path_str(&self, user_id: &Uuid, relative: &str) -> Result<PathBuf, DomainError> {
        let mut resolved: Vec<&str> = Vec::new();

        for segment in relative.split(['/', '\\']) {
            match segment {
                "" | "." => continue,
                ".." => {
                    if resolved.pop().is_none() {
                        return Err(DomainError::path_escape(format!(
                            "Path escapes user root: {}",
                            relative
                        )));
                    }
                }
                s if s.contains('\0') => {
                    return Err(DomainError::path_escape(format!(
                        "Path contains NUL byte: {}",
                        relative
                    )));
                }
                s => resolved.push(s),
            }
        }

        let mut path = self.user_root(user_id);
        for segment in resolved {
            path.push(segment);
        }
        Ok(path)
    }

    /// Absolute disk location of a logical path
    pub fn physical_path(
        &self,
        user_id: &Uuid,
        storage_path: &StoragePath,
    ) -> Result<PathBuf, DomainError> {
        self.physical_path_str(user_id, &storage_path.to_relative_string())
    }

    /// See [`StoragePath::remap_prefix`]; kept here as the path-facing
    /// entry point used by physical move/rename flows.
    pub fn remap_child_path(
        &self,
        child: &StoragePath,
        old_prefix: &StoragePath,
        new_prefix: &StoragePath,
    ) -> Option<StoragePath> {
        child.remap_prefix(old_prefix, new_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PathService {
        PathService::new(PathBuf::from("/srv/treevault"))
    }

    fn user() -> Uuid {
        Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap()
    }

    #[test]
    fn test_user_root_is_deterministic() {
        let svc = service();
        assert_eq!(svc.user_root(&user()), svc.user_root(&user()));
        assert!(svc
            .user_root(&user())
            .starts_with("/srv/treevault/users"));
    }

    #[test]
    fn test_physical_path_resolves_under_user_root() {
        let svc = service();
        let path = svc
            .physical_path(&user(), &StoragePath::from_string("Docs/Sub/b.txt"))
            .unwrap();
        assert_eq!(path, svc.user_root(&user()).join("Docs/Sub/b.txt"));
    }

    #[test]
    fn test_escape_is_rejected() {
        let svc = service();
        let result = svc.physical_path_str(&user(), "../../etc/passwd");
        let err = result.unwrap_err();
        assert_eq!(err.kind, crate::common::errors::ErrorKind::PathEscape);
    }

    #[test]
    fn test_interior_dotdot_within_sandbox_is_allowed() {
        let svc = service();
        let path = svc.physical_path_str(&user(), "Docs/../Other/a.txt").unwrap();
        assert_eq!(path, svc.user_root(&user()).join("Other/a.txt"));
    }

    #[test]
    fn test_dotdot_at_boundary_is_rejected() {
        // `Docs/../..` resolves exactly one level above the root
        let svc = service();
        assert!(svc.physical_path_str(&user(), "Docs/../../x").is_err());
    }

    #[test]
    fn test_remap_child_path_substitutes_prefix() {
        let svc = service();
        let child = StoragePath::from_string("Docs/Sub/b.txt");
        let old = StoragePath::from_string("Docs");
        let new = StoragePath::from_string("Documents");

        let remapped = svc.remap_child_path(&child, &old, &new).unwrap();
        assert_eq!(remapped.to_relative_string(), "Documents/Sub/b.txt");
    }

    #[test]
    fn test_remap_child_path_rejects_non_descendant() {
        let svc = service();
        let child = StoragePath::from_string("Other/b.txt");
        let old = StoragePath::from_string("Docs");
        let new = StoragePath::from_string("Documents");
        assert!(svc.remap_child_path(&child, &old, &new).is_none());
    }

    #[test]
    fn test_relative_string_has_no_leading_slash() {
        let path = StoragePath::from_string("/Docs/Sub/");
        assert_eq!(path.to_relative_string(), "Docs/Sub");
        assert_eq!(path.to_string(), "/Docs/Sub");
    }

    #[test]
    fn test_parent_and_file_name() {
        let path = StoragePath::from_string("Docs/Sub/b.txt");
        assert_eq!(path.file_name().as_deref(), Some("b.txt"));
        assert_eq!(path.parent().unwrap().to_relative_string(), "Docs/Sub");
        assert!(StoragePath::root().parent().is_none());
    }
}
