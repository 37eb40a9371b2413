//! People-intelligence policy and workspace profile inputs.
//!
//! The policy file is read leniently: each field is validated on its own and
//! falls back to its default, so one bad value never discards the rest.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::frontmatter::Document;
use crate::storage::ContentStore;
use crate::util;
use crate::workspace::WorkspacePaths;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.65;
pub const MIN_CONFIDENCE_THRESHOLD: f64 = 0.05;
pub const MAX_CONFIDENCE_THRESHOLD: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingIntent {
    #[default]
    Track,
    Defer,
    Ignore,
}

impl TrackingIntent {
    pub fn from_str_lossy(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "track" => Some(Self::Track),
            "defer" => Some(Self::Defer),
            "ignore" => Some(Self::Ignore),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureToggles {
    #[serde(default)]
    pub enable_extraction_tuning: bool,
    #[serde(default)]
    pub enable_enrichment: bool,
}

/// Per-call feature overrides; `None` keeps the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureOverrides {
    #[serde(default)]
    pub enable_extraction_tuning: Option<bool>,
    #[serde(default)]
    pub enable_enrichment: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub confidence_threshold: f64,
    pub default_tracking_intent: TrackingIntent,
    pub features: FeatureToggles,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            default_tracking_intent: TrackingIntent::Track,
            features: FeatureToggles::default(),
        }
    }
}

fn clamp_threshold(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_CONFIDENCE_THRESHOLD, MAX_CONFIDENCE_THRESHOLD)
    } else {
        DEFAULT_CONFIDENCE_THRESHOLD
    }
}

impl Policy {
    /// Build a policy from arbitrary JSON, field by field.
    pub fn sanitize(value: &Value) -> Self {
        let mut policy = Policy::default();
        let Some(obj) = value.as_object() else {
            return policy;
        };

        if let Some(t) = obj.get("confidenceThreshold").and_then(Value::as_f64) {
            policy.confidence_threshold = clamp_threshold(t);
        }
        if let Some(intent) = obj
            .get("defaultTrackingIntent")
            .and_then(Value::as_str)
            .and_then(TrackingIntent::from_str_lossy)
        {
            policy.default_tracking_intent = intent;
        }
        if let Some(features) = obj.get("features").and_then(Value::as_object) {
            if let Some(b) = features.get("enableExtractionTuning").and_then(Value::as_bool) {
                policy.features.enable_extraction_tuning = b;
            }
            if let Some(b) = features.get("enableEnrichment").and_then(Value::as_bool) {
                policy.features.enable_enrichment = b;
            }
        }
        policy
    }

    /// Apply call-time overrides on top of the stored policy.
    pub fn merged(
        mut self,
        confidence_threshold: Option<f64>,
        default_tracking_intent: Option<TrackingIntent>,
        features: Option<FeatureOverrides>,
    ) -> Self {
        if let Some(t) = confidence_threshold {
            self.confidence_threshold = clamp_threshold(t);
        }
        if let Some(intent) = default_tracking_intent {
            self.default_tracking_intent = intent;
        }
        if let Some(f) = features {
            if let Some(b) = f.enable_extraction_tuning {
                self.features.enable_extraction_tuning = b;
            }
            if let Some(b) = f.enable_enrichment {
                self.features.enable_enrichment = b;
            }
        }
        self
    }
}

/// Stored policy, or defaults when the file is missing or not JSON.
pub async fn load_policy(store: &dyn ContentStore, paths: &WorkspacePaths) -> Result<Policy> {
    let path = paths.policy_file();
    let Some(content) = store.read(&path).await? else {
        return Ok(Policy::default());
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(value) => Ok(Policy::sanitize(&value)),
        Err(e) => {
            log::warn!("Invalid policy at {}: {}; using defaults", path.display(), e);
            Ok(Policy::default())
        }
    }
}

/// Internal domains: explicit ones plus those implied by the workspace
/// profile (email domain, website host) and the domain-hints file.
pub async fn load_internal_domains(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    explicit: &[String],
) -> Result<Vec<String>> {
    let mut domains: Vec<String> = explicit.to_vec();

    if let Some(content) = store.read(&paths.profile_file()).await? {
        let profile = Document::parse(&content);
        if let Some(domain) = profile.get_str("email").and_then(|e| util::email_domain(&e)) {
            domains.push(domain);
        }
        if let Some(host) = profile.get_str("website").and_then(|w| util::website_host(&w)) {
            domains.push(host);
        }
    }
    if let Some(content) = store.read(&paths.domain_hints_file()).await? {
        domains.extend(Document::parse(&content).get_list("domains"));
    }

    Ok(util::normalize_domains(&domains))
}
