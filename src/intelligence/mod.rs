//! People-classification pipeline.
//!
//! `suggest` classifies a batch of candidates against the stored policy,
//! rolls the results into a digest, and appends a metrics snapshot.

pub mod classify;
pub mod policy;
pub mod snapshots;

pub use classify::*;
pub use policy::*;
pub use snapshots::*;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::people;
use crate::storage::ContentStore;
use crate::types::{Person, PEOPLE_CATEGORIES};
use crate::workspace::WorkspacePaths;

/// Per-call options. Set fields override the stored policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestOptions {
    #[serde(default)]
    pub internal_domains: Vec<String>,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    #[serde(default)]
    pub default_tracking_intent: Option<TrackingIntent>,
    #[serde(default)]
    pub features: Option<FeatureOverrides>,
    #[serde(default)]
    pub extraction_quality_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestMode {
    #[default]
    Digest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Digest {
    pub mode: DigestMode,
    pub total_candidates: usize,
    pub suggested_count: usize,
    pub unknown_queue_count: usize,
    pub suggestions: Vec<Suggestion>,
    pub metrics: Metrics,
    pub policy: Policy,
}

/// Existing people keyed by lowercased email. Earlier categories win.
async fn people_by_email(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
) -> Result<HashMap<String, Person>> {
    let mut by_email = HashMap::new();
    for category in PEOPLE_CATEGORIES {
        for person in people::list_people(store, paths, Some(category)).await? {
            if let Some(email) = person.email.as_deref() {
                let key = email.trim().to_lowercase();
                if !key.is_empty() {
                    by_email.entry(key).or_insert(person);
                }
            }
        }
    }
    Ok(by_email)
}

/// Classify `candidates` and record a metrics snapshot.
pub async fn suggest(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    candidates: &[Candidate],
    options: &SuggestOptions,
) -> Result<Digest> {
    let policy = load_policy(store, paths).await?.merged(
        options.confidence_threshold,
        options.default_tracking_intent,
        options.features,
    );
    let internal_domains = load_internal_domains(store, paths, &options.internal_domains).await?;
    let existing = people_by_email(store, paths).await?;
    let ctx = ClassifyContext {
        policy,
        internal_domains,
    };

    let suggestions: Vec<Suggestion> = candidates
        .iter()
        .map(|candidate| {
            let person = candidate
                .email
                .as_deref()
                .and_then(|e| existing.get(&e.trim().to_lowercase()));
            classify_candidate(candidate, &ctx, person)
        })
        .collect();

    let unknown_queue_count = suggestions
        .iter()
        .filter(|s| s.recommendation.category == RecommendedCategory::UnknownQueue)
        .count();
    let metrics = compute_metrics(&suggestions, options.extraction_quality_score);

    let digest = Digest {
        mode: DigestMode::Digest,
        total_candidates: suggestions.len(),
        suggested_count: suggestions.len() - unknown_queue_count,
        unknown_queue_count,
        suggestions,
        metrics: metrics.clone(),
        policy,
    };

    let snapshot = Snapshot::now(metrics, digest.total_candidates, unknown_queue_count);
    append_snapshot(store, paths, &snapshot).await?;

    log::info!(
        "People intelligence: {} candidate(s), {} suggested, {} in unknown queue",
        digest.total_candidates,
        digest.suggested_count,
        digest.unknown_queue_count
    );
    Ok(digest)
}
