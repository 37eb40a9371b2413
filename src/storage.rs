//! Content store abstraction and file-system implementation.
//!
//! Every read the core performs goes through `ContentStore`, so services can
//! run against the real workspace (`FileStore`) or an in-memory tree
//! (`MemoryStore`). Listings are returned sorted by path: resolver tie-breaks
//! depend on discovery order, and a sorted listing makes that order stable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use walkdir::WalkDir;

use crate::error::{IntelError, Result};

/// Listing filters for [`ContentStore::list`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub recursive: bool,
    /// Case-insensitive suffixes such as `".md"`. Empty means any file.
    pub extensions: Vec<String>,
}

impl ListOptions {
    /// Markdown files directly inside the directory.
    pub fn markdown() -> Self {
        Self {
            recursive: false,
            extensions: vec![".md".to_string()],
        }
    }

    /// Markdown files at any depth.
    pub fn markdown_recursive() -> Self {
        Self {
            recursive: true,
            extensions: vec![".md".to_string()],
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let lower = path.to_string_lossy().to_lowercase();
        self.extensions
            .iter()
            .any(|ext| lower.ends_with(&ext.to_lowercase()))
    }
}

/// Narrow storage interface consumed by the core.
///
/// Contract:
/// - `read` returns `Ok(None)` for a missing file.
/// - `list` and `list_subdirectories` return paths sorted lexicographically,
///   return an empty list for a missing directory, and skip directories whose
///   name starts with `.` or `_`.
/// - `write` creates parent directories as needed.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn exists(&self, path: &Path) -> Result<bool>;
    async fn read(&self, path: &Path) -> Result<Option<String>>;
    async fn write(&self, path: &Path, content: &str) -> Result<()>;
    async fn delete(&self, path: &Path) -> Result<()>;
    async fn list(&self, dir: &Path, options: &ListOptions) -> Result<Vec<PathBuf>>;
    async fn list_subdirectories(&self, dir: &Path) -> Result<Vec<PathBuf>>;
    async fn mkdir(&self, dir: &Path) -> Result<()>;
}

fn is_hidden_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.') || n.starts_with('_'))
        .unwrap_or(false)
}

// =============================================================================
// File system
// =============================================================================

/// `ContentStore` backed by the local file system.
#[derive(Debug, Clone, Default)]
pub struct FileStore;

impl FileStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentStore for FileStore {
    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path)
            .await
            .map_err(|e| IntelError::io(path, e))
    }

    async fn read(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                log::debug!("Skipping non-UTF-8 file {}", path.display());
                Ok(None)
            }
            Err(e) => Err(IntelError::io(path, e)),
        }
    }

    /// Write via a sibling temp file and rename, so readers never observe a
    /// half-written document.
    async fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| IntelError::io(parent, e))?;
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("content");
        let tmp = path.with_file_name(format!(".{}.tmp", file_name));
        fs::write(&tmp, content)
            .await
            .map_err(|e| IntelError::io(&tmp, e))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| IntelError::io(path, e))
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let meta = match fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(IntelError::io(path, e)),
        };
        let result = if meta.is_dir() {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_file(path).await
        };
        result.map_err(|e| IntelError::io(path, e))
    }

    async fn list(&self, dir: &Path, options: &ListOptions) -> Result<Vec<PathBuf>> {
        let meta = match fs::metadata(dir).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(IntelError::io(dir, e)),
        };
        if meta.is_file() {
            return Ok(if options.accepts(dir) {
                vec![dir.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        let root = dir.to_path_buf();
        let options = options.clone();
        let listed = tokio::task::spawn_blocking(move || {
            let max_depth = if options.recursive { usize::MAX } else { 1 };
            let mut files: Vec<PathBuf> = WalkDir::new(&root)
                .min_depth(1)
                .max_depth(max_depth)
                .into_iter()
                .filter_entry(|e| !(e.file_type().is_dir() && is_hidden_name(e.path())))
                .filter_map(|entry| match entry {
                    Ok(e) => Some(e),
                    Err(err) => {
                        log::debug!("Skipping unreadable entry under {}: {}", root.display(), err);
                        None
                    }
                })
                .filter(|e| e.file_type().is_file() && options.accepts(e.path()))
                .map(|e| e.into_path())
                .collect();
            files.sort();
            files
        })
        .await
        .map_err(|e| IntelError::Storage(format!("Listing task failed: {}", e)))?;

        Ok(listed)
    }

    async fn list_subdirectories(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        match fs::metadata(dir).await {
            Ok(m) if m.is_dir() => {}
            Ok(_) => return Ok(Vec::new()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(IntelError::io(dir, e)),
        }

        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| IntelError::io(dir, e))?;

        let mut dirs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| IntelError::io(dir, e))?
        {
            let path = entry.path();
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir && !is_hidden_name(&path) {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    async fn mkdir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| IntelError::io(dir, e))
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// `ContentStore` over an in-memory map of absolute path → content.
///
/// Directories are implicit: a directory exists if any file lives under it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file directly (seeding fixtures).
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.lock().insert(path.into(), content.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, String>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn has_hidden_dir_between(dir: &Path, path: &Path) -> bool {
        path.strip_prefix(dir)
            .map(|rel| {
                let mut parts: Vec<_> = rel.components().collect();
                parts.pop();
                parts.iter().any(|c| {
                    let s = c.as_os_str().to_string_lossy();
                    s.starts_with('.') || s.starts_with('_')
                })
            })
            .unwrap_or(true)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn exists(&self, path: &Path) -> Result<bool> {
        let files = self.lock();
        Ok(files.contains_key(path) || files.keys().any(|k| k.starts_with(path)))
    }

    async fn read(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.lock().get(path).cloned())
    }

    async fn write(&self, path: &Path, content: &str) -> Result<()> {
        self.lock().insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        self.lock().retain(|k, _| !k.starts_with(path));
        Ok(())
    }

    async fn list(&self, dir: &Path, options: &ListOptions) -> Result<Vec<PathBuf>> {
        let files = self.lock();
        // BTreeMap iteration is already sorted by path.
        Ok(files
            .keys()
            .filter(|k| k.starts_with(dir) && k.as_path() != dir)
            .filter(|k| options.recursive || k.parent() == Some(dir))
            .filter(|k| !Self::has_hidden_dir_between(dir, k))
            .filter(|k| options.accepts(k))
            .cloned()
            .collect())
    }

    async fn list_subdirectories(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let files = self.lock();
        let mut dirs: Vec<PathBuf> = files
            .keys()
            .filter_map(|k| {
                let rel = k.strip_prefix(dir).ok()?;
                let mut comps = rel.components();
                let first = comps.next()?;
                comps.next()?;
                Some(dir.join(first.as_os_str()))
            })
            .filter(|p| !is_hidden_name(p))
            .collect();
        dirs.sort();
        dirs.dedup();
        Ok(dirs)
    }

    async fn mkdir(&self, _dir: &Path) -> Result<()> {
        Ok(())
    }
}
