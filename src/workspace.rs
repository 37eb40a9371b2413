//! Workspace directory layout.
//!
//! The core never discovers these locations itself; callers construct a
//! `WorkspacePaths` (usually via [`WorkspacePaths::new`]) and may repoint any
//! field.

use std::path::{Component, Path, PathBuf};

use crate::types::PersonCategory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub people: PathBuf,
    pub meetings: PathBuf,
    pub conversations: PathBuf,
    pub context: PathBuf,
    pub memory: PathBuf,
    pub projects: PathBuf,
}

impl WorkspacePaths {
    /// Standard layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            people: root.join("people"),
            meetings: root.join("resources").join("meetings"),
            conversations: root.join("resources").join("conversations"),
            context: root.join("context"),
            memory: root.join("memory"),
            projects: root.join("projects"),
            root,
        }
    }

    pub fn people_category(&self, category: PersonCategory) -> PathBuf {
        self.people.join(category.as_str())
    }

    pub fn person_file(&self, category: PersonCategory, slug: &str) -> PathBuf {
        self.people_category(category).join(format!("{}.md", slug))
    }

    pub fn people_index(&self) -> PathBuf {
        self.people.join("index.md")
    }

    pub fn memory_items(&self) -> PathBuf {
        self.memory.join("items")
    }

    pub fn active_projects(&self) -> PathBuf {
        self.projects.join("active")
    }

    pub fn archived_projects(&self) -> PathBuf {
        self.projects.join("archive")
    }

    pub fn policy_file(&self) -> PathBuf {
        self.context.join("people-intelligence-policy.json")
    }

    pub fn profile_file(&self) -> PathBuf {
        self.context.join("profile.md")
    }

    pub fn domain_hints_file(&self) -> PathBuf {
        self.context.join("domain-hints.md")
    }

    pub fn snapshot_log(&self) -> PathBuf {
        self.memory.join("metrics").join("people-intelligence.jsonl")
    }

    /// Absolute, lexically normalized form of `path` for cache keys.
    ///
    /// Relative paths are taken relative to the workspace root unless they
    /// already start with a relative root; `.` and `..` components are folded
    /// without touching the filesystem.
    pub fn normalize(&self, path: &Path) -> PathBuf {
        let rooted = path.is_absolute() || (self.root.is_relative() && path.starts_with(&self.root));
        let joined = if rooted {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let mut out = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    out.pop();
                }
                other => out.push(other.as_os_str()),
            }
        }
        out
    }
}

/// True if `path` lives under `dir`, compared component-wise so that
/// `meetings-archive/` is not treated as inside `meetings/`.
pub fn is_within(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir) && path != dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout() {
        let paths = WorkspacePaths::new("/ws");
        assert_eq!(paths.meetings, PathBuf::from("/ws/resources/meetings"));
        assert_eq!(
            paths.person_file(PersonCategory::Customers, "bob"),
            PathBuf::from("/ws/people/customers/bob.md")
        );
        assert_eq!(
            paths.snapshot_log(),
            PathBuf::from("/ws/memory/metrics/people-intelligence.jsonl")
        );
    }

    #[test]
    fn test_normalize_relative_and_dotted_paths() {
        let paths = WorkspacePaths::new("/ws");
        let a = paths.normalize(Path::new("resources/meetings/2026-02-10-sync.md"));
        let b = paths.normalize(Path::new("/ws/resources/./notes/../meetings/2026-02-10-sync.md"));
        assert_eq!(a, b);
        assert_eq!(a, PathBuf::from("/ws/resources/meetings/2026-02-10-sync.md"));
    }

    #[test]
    fn test_normalize_with_relative_root() {
        let paths = WorkspacePaths::new("ws");
        let listed = paths.normalize(Path::new("ws/resources/meetings/a.md"));
        let hit = paths.normalize(Path::new("resources/meetings/a.md"));
        assert_eq!(listed, PathBuf::from("ws/resources/meetings/a.md"));
        assert_eq!(listed, hit);
    }

    #[test]
    fn test_is_within_avoids_prefix_collisions() {
        let meetings = Path::new("/ws/resources/meetings");
        assert!(is_within(Path::new("/ws/resources/meetings/a.md"), meetings));
        assert!(!is_within(Path::new("/ws/resources/meetings-archive/a.md"), meetings));
    }
}
