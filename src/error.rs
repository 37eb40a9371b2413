//! Error types for entity intelligence operations
//!
//! Data-shape problems (missing files, malformed frontmatter, bad policy
//! values, unparsable snapshot lines) are never errors here. They degrade to
//! empty or default values at the point they are read. What remains are
//! failures of the collaborators themselves:
//! - Io: the content store could not read, write, or list a path
//! - Serialize: a value we produced could not be encoded
//! - Search: the search-assist collaborator failed
//! - Storage: a non-I/O content store failure

use std::path::PathBuf;
use thiserror::Error;

/// Error types for entity intelligence operations
#[derive(Debug, Error)]
pub enum IntelError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Search assist failed: {0}")]
    Search(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl IntelError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IntelError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IntelError>;
