//! Free-text reference → ranked workspace entities.
//!
//! Each entity kind produces candidates from its own area of the workspace.
//! Every signal for one candidate is scored independently and the candidate
//! keeps the strongest one. Candidates that score 0 are dropped; the rest are
//! ranked by score with discovery order preserved on ties.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::entity::{EntityQuery, EntityType};
use crate::error::Result;
use crate::frontmatter::Document;
use crate::matcher::{self, normalize, score};
use crate::storage::{ContentStore, ListOptions};
use crate::types::{ResolvedEntity, PEOPLE_CATEGORIES};
use crate::util;
use crate::workspace::WorkspacePaths;

pub const DEFAULT_LIMIT: usize = 5;

// Fixed scores for signals that bypass fuzzy name matching.
const EMAIL_EXACT_SCORE: u32 = 95;
const EMAIL_LOCAL_PART_SCORE: u32 = 60;
const MEETING_DATE_SCORE: u32 = 80;
const ATTENDEE_NAME_CAP: u32 = 50;
const ATTENDEE_ID_SCORE: u32 = 40;

const SUMMARY_LINES: usize = 2;
const SUMMARY_MAX_CHARS: usize = 200;

/// Best match for `reference`, or `None` if nothing scores above 0.
pub async fn resolve(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    reference: &str,
    query: EntityQuery,
) -> Result<Option<ResolvedEntity>> {
    let mut ranked = resolve_all(store, paths, reference, query, 1).await?;
    Ok(ranked.pop())
}

/// Up to `limit` matches for `reference`, best first.
pub async fn resolve_all(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    reference: &str,
    query: EntityQuery,
    limit: usize,
) -> Result<Vec<ResolvedEntity>> {
    let reference = reference.trim();
    if reference.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let mut candidates = Vec::new();
    for kind in query.kinds() {
        let found = match kind {
            EntityType::Person => person_candidates(store, paths, reference).await?,
            EntityType::Meeting => meeting_candidates(store, paths, reference).await?,
            EntityType::Project => project_candidates(store, paths, reference).await?,
        };
        candidates.extend(found);
    }

    candidates.retain(|c| c.score > 0);
    // Stable: equal scores keep listing order.
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates.truncate(limit);

    log::debug!(
        "Resolved '{}' ({:?}): {} candidate(s)",
        reference,
        query,
        candidates.len()
    );
    Ok(candidates)
}

// =============================================================================
// People
// =============================================================================

async fn person_candidates(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    reference: &str,
) -> Result<Vec<ResolvedEntity>> {
    let reference_slug = util::slugify(reference);
    let reference_lower = reference.to_lowercase();
    let mut out = Vec::new();

    for category in PEOPLE_CATEGORIES {
        let dir = paths.people_category(category);
        for path in store.list(&dir, &ListOptions::markdown()).await? {
            if util::is_index_file(&path) {
                continue;
            }
            let Some(content) = store.read(&path).await? else {
                continue;
            };
            let doc = Document::parse(&content);
            let slug = util::file_stem(&path);
            let name = doc.get_str("name").unwrap_or_else(|| slug.clone());

            let mut best = score(reference, &name).max(score(&reference_slug, &slug));
            if let Some(email) = doc.get_str("email") {
                let email = email.to_lowercase();
                if email == reference_lower {
                    best = best.max(EMAIL_EXACT_SCORE);
                } else if email.starts_with(&format!("{}@", reference_lower)) {
                    best = best.max(EMAIL_LOCAL_PART_SCORE);
                }
            }

            let mut metadata = doc.data;
            metadata.insert(
                "category".to_string(),
                Value::String(category.as_str().to_string()),
            );
            out.push(ResolvedEntity {
                entity_type: EntityType::Person,
                path,
                name,
                slug,
                metadata,
                score: best,
            });
        }
    }
    Ok(out)
}

// =============================================================================
// Meetings
// =============================================================================

async fn meeting_candidates(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    reference: &str,
) -> Result<Vec<ResolvedEntity>> {
    let normalized_ref = normalize(reference);
    let mut out = Vec::new();

    for path in store.list(&paths.meetings, &ListOptions::markdown()).await? {
        if util::is_index_file(&path) {
            continue;
        }
        let Some(content) = store.read(&path).await? else {
            continue;
        };
        let doc = Document::parse(&content);
        let stem = util::file_stem(&path);
        let title = doc.get_str("title");

        let mut best = score(reference, &stem);
        if let Some(ref title) = title {
            best = best.max(score(reference, title));
        }

        let date = doc.get_str("date").or_else(|| util::date_token(&stem));
        if let Some(ref date) = date {
            let normalized_date = normalize(date);
            if !normalized_date.is_empty() && normalized_ref.contains(&normalized_date) {
                best = best.max(MEETING_DATE_SCORE);
            }
        }

        if let Some(attendees) = doc.get_joined("attendees") {
            best = best.max(score(reference, &attendees).min(ATTENDEE_NAME_CAP));
        }
        for id in doc.get_list("attendee_ids") {
            let id = normalize(&id);
            if !id.is_empty() && (id.contains(&normalized_ref) || normalized_ref.contains(&id)) {
                best = best.max(ATTENDEE_ID_SCORE);
            }
        }

        out.push(ResolvedEntity {
            entity_type: EntityType::Meeting,
            name: title.unwrap_or_else(|| stem.clone()),
            path,
            slug: stem,
            metadata: doc.data,
            score: best,
        });
    }
    Ok(out)
}

// =============================================================================
// Projects
// =============================================================================

async fn project_candidates(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    reference: &str,
) -> Result<Vec<ResolvedEntity>> {
    let reference_words: Vec<String> = matcher::words(reference)
        .into_iter()
        .filter(|w| w.chars().count() > 1)
        .collect();
    let mut out = Vec::new();

    for (root, status) in [
        (paths.active_projects(), "active"),
        (paths.archived_projects(), "archived"),
    ] {
        for dir in store.list_subdirectories(&root).await? {
            let project = read_project(store, &dir).await?;

            let mut best = score(reference, &project.dir_name);
            if let Some(ref h1) = project.doc.first_h1() {
                best = best.max(score(reference, h1));
            }
            if let Some(ref title) = project.doc.get_str("title") {
                best = best.max(score(reference, title));
            }
            best = best.max(body_overlap_score(&reference_words, &project.doc.body));

            let mut metadata = project.doc.data.clone();
            metadata.insert("status".to_string(), Value::String(status.to_string()));
            metadata.insert(
                "summary".to_string(),
                Value::String(summarize(&project.doc.body)),
            );
            out.push(ResolvedEntity {
                entity_type: EntityType::Project,
                name: project.title(),
                path: dir,
                slug: project.dir_name,
                metadata,
                score: best,
            });
        }
    }
    Ok(out)
}

/// A project directory and its parsed README (empty if absent).
pub(crate) struct ProjectDoc {
    pub dir_name: String,
    pub readme: PathBuf,
    pub doc: Document,
}

impl ProjectDoc {
    /// Frontmatter title, else README H1, else directory name.
    pub fn title(&self) -> String {
        self.doc
            .get_str("title")
            .or_else(|| self.doc.first_h1())
            .unwrap_or_else(|| self.dir_name.clone())
    }
}

pub(crate) async fn read_project(store: &dyn ContentStore, dir: &Path) -> Result<ProjectDoc> {
    let readme = dir.join("README.md");
    let doc = match store.read(&readme).await? {
        Some(content) => Document::parse(&content),
        None => Document {
            data: Map::new(),
            body: String::new(),
        },
    };
    Ok(ProjectDoc {
        dir_name: util::file_name(dir),
        readme,
        doc,
    })
}

/// `10 × hits` when at least half of the reference words occur in the body.
fn body_overlap_score(reference_words: &[String], body: &str) -> u32 {
    if reference_words.is_empty() || body.is_empty() {
        return 0;
    }
    let body = normalize(body);
    let hits = reference_words
        .iter()
        .filter(|w| body.contains(w.as_str()))
        .count();
    if hits * 2 >= reference_words.len() {
        hits as u32 * 10
    } else {
        0
    }
}

/// First non-heading lines of a body, joined and cut for display.
fn summarize(body: &str) -> String {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .take(SUMMARY_LINES)
        .collect();
    util::truncate_chars(&lines.join(" "), SUMMARY_MAX_CHARS)
}
