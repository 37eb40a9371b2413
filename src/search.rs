//! Optional semantic search collaborator.
//!
//! Used only as a pre-filter hint when mining person memory. Results narrow
//! which meeting files get read; they never decide that a file is skipped
//! when the index might be incomplete.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One search result. `path` may be absolute or workspace-relative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub path: PathBuf,
    #[serde(default)]
    pub score: f64,
}

#[async_trait]
pub trait SearchAssist: Send + Sync {
    async fn semantic_search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}
