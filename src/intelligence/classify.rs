//! Heuristic classification of contact-like candidates.
//!
//! Confidence starts at a base value and accumulates fixed increments per
//! signal (role keywords, enrichment, email domain, existing person record).
//! Anything that ends below the policy threshold is routed to the unknown
//! queue with a deferred tracking intent.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{Person, PersonCategory};
use crate::util;

use super::policy::{Policy, TrackingIntent};

const BASE_CONFIDENCE: f64 = 0.20;
const ROLE_LENS_BOOST: f64 = 0.25;
const ENRICHMENT_BOOST: f64 = 0.08;
const INTERNAL_DOMAIN_BOOST: f64 = 0.45;
const EXTERNAL_DOMAIN_BOOST: f64 = 0.20;
const EXISTING_PERSON_BOOST: f64 = 0.20;
const MAX_CONFIDENCE: f64 = 0.99;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affiliation {
    Internal,
    External,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleLens {
    Customer,
    User,
    Partner,
    #[default]
    Unknown,
}

impl RoleLens {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleLens::Customer => "customer",
            RoleLens::User => "user",
            RoleLens::Partner => "partner",
            RoleLens::Unknown => "unknown",
        }
    }
}

/// Routing target: a people folder, or the review queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedCategory {
    Internal,
    Customers,
    Users,
    UnknownQueue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceKind {
    EmailDomain,
    ProfileHint,
    TextSignal,
    ExistingPerson,
    Enrichment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub kind: EvidenceKind,
    pub source: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionStatus {
    Recommended,
    NeedsReview,
}

/// A contact-like record to classify. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Ground truth, when known, for misclassification tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_role_lens: Option<RoleLens>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub affiliation: Affiliation,
    pub role_lens: RoleLens,
    pub tracking_intent: TrackingIntent,
    pub category: RecommendedCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub candidate: Candidate,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub rationale: String,
    pub evidence: Vec<Evidence>,
    pub status: SuggestionStatus,
    pub enrichment_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// `None` when no candidate carried a comparable ground truth.
    pub misclassification_rate: Option<f64>,
    pub triage_burden_minutes: u32,
    #[serde(default)]
    pub interruption_complaint_rate: f64,
    pub unknown_queue_rate: f64,
    pub extraction_quality_score: Option<f64>,
}

/// Inputs shared by every candidate in one classification call.
#[derive(Debug, Clone, Default)]
pub struct ClassifyContext {
    pub policy: Policy,
    pub internal_domains: Vec<String>,
}

// =============================================================================
// Keyword detection
// =============================================================================

fn re_customer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(customer|client|buyer|account|renewal|procurement)s?\b").unwrap()
    })
}

fn re_user() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(end user|user|beta|tester|participant|interview)s?\b").unwrap()
    })
}

fn re_partner() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(partner|reseller|agency|vendor)s?\b").unwrap())
}

fn re_customer_company() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(customer|client|buyer|enterprise|corp|inc|llc|ltd)\b").unwrap()
    })
}

/// First role lens whose vocabulary appears in `text`, with the matched word.
pub fn detect_role_lens(text: &str) -> Option<(RoleLens, String)> {
    [
        (RoleLens::Customer, re_customer()),
        (RoleLens::User, re_user()),
        (RoleLens::Partner, re_partner()),
    ]
    .into_iter()
    .find_map(|(lens, re)| re.find(text).map(|m| (lens, m.as_str().to_lowercase())))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn candidate_source(candidate: &Candidate) -> String {
    candidate
        .source
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "candidate".to_string())
}

// =============================================================================
// Classification
// =============================================================================

/// Classify one candidate. `existing` is the person record whose email
/// matches the candidate's, if any.
pub fn classify_candidate(
    candidate: &Candidate,
    ctx: &ClassifyContext,
    existing: Option<&Person>,
) -> Suggestion {
    let policy = &ctx.policy;
    let source = candidate_source(candidate);
    let mut confidence = BASE_CONFIDENCE;
    let mut evidence = Vec::new();
    let mut reasons: Vec<String> = Vec::new();
    let mut affiliation = Affiliation::Unknown;
    let mut role_lens = RoleLens::Unknown;
    let mut enrichment_applied = false;

    let merged = [&candidate.name, &candidate.company, &candidate.text]
        .iter()
        .filter_map(|f| f.as_deref())
        .collect::<Vec<_>>()
        .join(" ");
    let merged = if policy.features.enable_extraction_tuning {
        merged.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        merged
    };

    if let Some((lens, keyword)) = detect_role_lens(&merged) {
        role_lens = lens;
        confidence += ROLE_LENS_BOOST;
        evidence.push(Evidence {
            kind: EvidenceKind::TextSignal,
            source: source.clone(),
            snippet: format!("matched \"{}\"", keyword),
        });
        reasons.push(format!("text suggests {} role", lens.as_str()));
    }

    if policy.features.enable_enrichment {
        if let Some(company) = candidate.company.as_deref().filter(|c| !c.trim().is_empty()) {
            enrichment_applied = true;
            confidence += ENRICHMENT_BOOST;
            evidence.push(Evidence {
                kind: EvidenceKind::Enrichment,
                source: "company".to_string(),
                snippet: company.trim().to_string(),
            });
            if role_lens == RoleLens::Unknown && re_customer_company().is_match(company) {
                role_lens = RoleLens::Customer;
                reasons.push("company looks like a customer organization".to_string());
            }
        }
    }

    if let Some(email) = candidate.email.as_deref() {
        if let Some(domain) = util::email_domain(email) {
            let internal = ctx.internal_domains.iter().any(|d| *d == domain);
            if internal {
                affiliation = Affiliation::Internal;
                confidence += INTERNAL_DOMAIN_BOOST;
            } else {
                affiliation = Affiliation::External;
                confidence += EXTERNAL_DOMAIN_BOOST;
            }
            let label = if internal { "internal" } else { "external" };
            evidence.push(Evidence {
                kind: EvidenceKind::EmailDomain,
                source: email.trim().to_string(),
                snippet: format!("{} domain {}", label, domain),
            });
            reasons.push(format!("{} email domain", label));
        }
    }

    if let Some(person) = existing {
        confidence += EXISTING_PERSON_BOOST;
        evidence.push(Evidence {
            kind: EvidenceKind::ExistingPerson,
            source: format!("people/{}/{}.md", person.category.as_str(), person.slug),
            snippet: format!("matches existing person {}", person.name),
        });
        reasons.push(format!("already tracked in {}", person.category.as_str()));
        match person.category {
            PersonCategory::Internal => affiliation = Affiliation::Internal,
            PersonCategory::Customers if role_lens == RoleLens::Unknown => {
                role_lens = RoleLens::Customer
            }
            PersonCategory::Users if role_lens == RoleLens::Unknown => {
                role_lens = RoleLens::User
            }
            _ => {}
        }
    }

    if !ctx.internal_domains.is_empty() {
        evidence.push(Evidence {
            kind: EvidenceKind::ProfileHint,
            source: "workspace profile".to_string(),
            snippet: format!("internal domains: {}", ctx.internal_domains.join(", ")),
        });
    }

    let confidence = round2(confidence).clamp(0.0, MAX_CONFIDENCE);

    let initial_category = match (affiliation, role_lens) {
        (Affiliation::Internal, _) => RecommendedCategory::Internal,
        (_, RoleLens::Customer) => RecommendedCategory::Customers,
        (_, RoleLens::User) => RecommendedCategory::Users,
        _ => RecommendedCategory::UnknownQueue,
    };

    let low_confidence = confidence < policy.confidence_threshold;
    let recommendation = if low_confidence {
        Recommendation {
            affiliation,
            role_lens: RoleLens::Unknown,
            tracking_intent: TrackingIntent::Defer,
            category: RecommendedCategory::UnknownQueue,
        }
    } else {
        Recommendation {
            affiliation,
            role_lens,
            tracking_intent: policy.default_tracking_intent,
            category: initial_category,
        }
    };

    let status = if !low_confidence && !evidence.is_empty() {
        SuggestionStatus::Recommended
    } else {
        SuggestionStatus::NeedsReview
    };

    let mut rationale = if reasons.is_empty() {
        "No affiliation or role signals found".to_string()
    } else {
        let mut text = reasons.join("; ");
        if let Some(first) = text.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        text
    };
    if low_confidence {
        rationale.push_str(&format!(
            ". Confidence {:.2} is below threshold {:.2}; routed to unknown queue",
            confidence, policy.confidence_threshold
        ));
    }

    Suggestion {
        candidate: candidate.clone(),
        recommendation,
        confidence,
        rationale,
        evidence,
        status,
        enrichment_applied,
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Review time for the unknown queue: 5 minutes per started batch of 5.
pub fn triage_burden_minutes(unknown_count: usize) -> u32 {
    if unknown_count == 0 {
        return 0;
    }
    let batches = unknown_count.div_ceil(5) as u32;
    (batches * 5).max(5)
}

pub fn compute_metrics(suggestions: &[Suggestion], extraction_quality_score: Option<f64>) -> Metrics {
    let total = suggestions.len();
    let unknown = suggestions
        .iter()
        .filter(|s| s.recommendation.category == RecommendedCategory::UnknownQueue)
        .count();

    let comparable: Vec<(RoleLens, RoleLens)> = suggestions
        .iter()
        .filter_map(|s| {
            let actual = s.candidate.actual_role_lens?;
            let predicted = s.recommendation.role_lens;
            (predicted != RoleLens::Unknown).then_some((actual, predicted))
        })
        .collect();
    let misclassification_rate = if comparable.is_empty() {
        None
    } else {
        let wrong = comparable.iter().filter(|(a, p)| a != p).count();
        Some(wrong as f64 / comparable.len() as f64)
    };

    Metrics {
        misclassification_rate,
        triage_burden_minutes: triage_burden_minutes(unknown),
        interruption_complaint_rate: 0.0,
        unknown_queue_rate: if total == 0 {
            0.0
        } else {
            unknown as f64 / total as f64
        },
        extraction_quality_score,
    }
}
