//! Append-only JSONL log of classification metrics.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::ContentStore;
use crate::workspace::WorkspacePaths;

use super::classify::Metrics;

/// Lines kept in the log; older entries are dropped on append.
pub const MAX_SNAPSHOTS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub created_at: String,
    pub metrics: Metrics,
    pub total_candidates: usize,
    pub unknown_queue_count: usize,
}

impl Snapshot {
    pub fn now(metrics: Metrics, total_candidates: usize, unknown_queue_count: usize) -> Self {
        Self {
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            metrics,
            total_candidates,
            unknown_queue_count,
        }
    }
}

/// Append one snapshot, keeping only the most recent [`MAX_SNAPSHOTS`] lines.
pub async fn append_snapshot(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    snapshot: &Snapshot,
) -> Result<()> {
    let path = paths.snapshot_log();
    let existing = store.read(&path).await?.unwrap_or_default();

    let mut lines: Vec<String> = existing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    lines.push(serde_json::to_string(snapshot)?);
    if lines.len() > MAX_SNAPSHOTS {
        lines.drain(..lines.len() - MAX_SNAPSHOTS);
    }

    let mut content = lines.join("\n");
    content.push('\n');
    store.write(&path, &content).await
}

/// The last `limit` readable snapshots, oldest first. Unparsable lines are skipped.
pub async fn get_recent_snapshots(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    limit: usize,
) -> Result<Vec<Snapshot>> {
    let path = paths.snapshot_log();
    let Some(content) = store.read(&path).await? else {
        return Ok(Vec::new());
    };

    let mut snapshots: Vec<Snapshot> = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Snapshot>(line) {
            Ok(s) => snapshots.push(s),
            Err(e) => log::warn!("Skipping snapshot line {} in {}: {}", i + 1, path.display(), e),
        }
    }

    let skip = snapshots.len().saturating_sub(limit);
    Ok(snapshots.split_off(skip))
}
