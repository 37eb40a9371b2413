//! Where an entity is referenced, and what it is connected to.
//!
//! Scanning is bounded to fixed workspace areas: `context/` (recursive), the
//! meetings, conversations, and memory-item folders (top level only), and
//! every active project directory (recursive).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::RegexBuilder;

use crate::entity::EntityType;
use crate::error::Result;
use crate::frontmatter::Document;
use crate::resolver::read_project;
use crate::storage::{ContentStore, ListOptions};
use crate::types::{
    EntityMention, EntityRelationship, MentionSourceType, RelationshipType, ResolvedEntity,
};
use crate::util;
use crate::workspace::{is_within, WorkspacePaths};

const EXCERPT_RADIUS: usize = 50;

/// Lowercased name and slug of an entity, whichever are non-empty.
fn needles(entity: &ResolvedEntity) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in [&entity.name, &entity.slug] {
        let lower = raw.trim().to_lowercase();
        if !lower.is_empty() && !out.contains(&lower) {
            out.push(lower);
        }
    }
    out
}

fn contains_any(text: &str, needles: &[String]) -> bool {
    let lower = text.to_lowercase();
    needles.iter().any(|n| lower.contains(n.as_str()))
}

// =============================================================================
// Mentions
// =============================================================================

/// Every scanned document whose text contains the entity's name or slug,
/// newest first. Undated mentions come last in discovery order.
pub async fn find_mentions(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    entity: &ResolvedEntity,
) -> Result<Vec<EntityMention>> {
    let needles = needles(entity);
    if needles.is_empty() {
        return Ok(Vec::new());
    }

    let mut sources = Vec::new();
    sources.extend(store.list(&paths.context, &ListOptions::markdown_recursive()).await?);
    sources.extend(store.list(&paths.meetings, &ListOptions::markdown()).await?);
    sources.extend(store.list(&paths.conversations, &ListOptions::markdown()).await?);
    sources.extend(store.list(&paths.memory_items(), &ListOptions::markdown()).await?);
    for project_dir in store.list_subdirectories(&paths.active_projects()).await? {
        sources.extend(store.list(&project_dir, &ListOptions::markdown_recursive()).await?);
    }

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut mentions = Vec::new();
    for path in sources {
        if !seen.insert(paths.normalize(&path)) {
            continue;
        }
        if path == entity.path || is_within(&path, &entity.path) {
            continue;
        }
        let Some(content) = store.read(&path).await? else {
            continue;
        };
        if !contains_any(&content, &needles) {
            continue;
        }

        let within_root = path
            .strip_prefix(&paths.root)
            .map(|rel| rel.to_string_lossy().into_owned())
            .unwrap_or_else(|_| util::file_name(&path));
        let date = util::date_token(&within_root)
            .or_else(|| Document::parse(&content).get_str("date"));
        mentions.push(EntityMention {
            entity: entity.name.clone(),
            entity_type: entity.entity_type,
            source_type: source_type(paths, &path),
            excerpt: excerpt(&content, &needles),
            source_path: path,
            date,
        });
    }

    mentions.sort_by(|a, b| match (&a.date, &b.date) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    log::debug!("Found {} mention(s) of '{}'", mentions.len(), entity.name);
    Ok(mentions)
}

/// Area a document lives in; the first matching area wins.
fn source_type(paths: &WorkspacePaths, path: &Path) -> MentionSourceType {
    let areas = [
        (&paths.meetings, MentionSourceType::Meeting),
        (&paths.conversations, MentionSourceType::Conversation),
        (&paths.memory, MentionSourceType::Memory),
        (&paths.projects, MentionSourceType::Project),
    ];
    areas
        .into_iter()
        .find(|(dir, _)| is_within(path, dir))
        .map(|(_, kind)| kind)
        .unwrap_or(MentionSourceType::Context)
}

/// Whitespace-collapsed window around the first occurrence of a needle.
fn excerpt(content: &str, needles: &[String]) -> String {
    let found = needles.iter().find_map(|needle| {
        RegexBuilder::new(&regex::escape(needle))
            .case_insensitive(true)
            .build()
            .ok()?
            .find(content)
            .map(|m| (m.start(), m.end()))
    });
    let Some((start, end)) = found else {
        return String::new();
    };

    let window_start = content[..start]
        .char_indices()
        .rev()
        .nth(EXCERPT_RADIUS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let window_end = content[end..]
        .char_indices()
        .nth(EXCERPT_RADIUS)
        .map(|(i, _)| end + i)
        .unwrap_or(content.len());

    let body = content[window_start..window_end]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let mut out = String::new();
    if window_start > 0 {
        out.push_str("...");
    }
    out.push_str(&body);
    if window_end < content.len() {
        out.push_str("...");
    }
    out
}

// =============================================================================
// Relationships
// =============================================================================

/// `works_on`, then `attended`, then `mentioned_in` edges for an entity.
pub async fn get_relationships(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    entity: &ResolvedEntity,
) -> Result<Vec<EntityRelationship>> {
    let needles = needles(entity);
    if needles.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();

    for project_dir in store.list_subdirectories(&paths.active_projects()).await? {
        let project = read_project(store, &project_dir).await?;
        if project_lists_member(&project.doc, &needles) {
            out.push(edge(
                entity,
                project.title(),
                EntityType::Project,
                RelationshipType::WorksOn,
                &project.readme,
            ));
        }
    }

    let name_slug = util::slugify(&entity.name);
    for path in store.list(&paths.meetings, &ListOptions::markdown()).await? {
        if util::is_index_file(&path) {
            continue;
        }
        let Some(content) = store.read(&path).await? else {
            continue;
        };
        let doc = Document::parse(&content);
        if meeting_lists_attendee(&doc, &needles, &entity.slug, &name_slug) {
            let title = doc.get_str("title").unwrap_or_else(|| util::file_stem(&path));
            out.push(edge(
                entity,
                title,
                EntityType::Meeting,
                RelationshipType::Attended,
                &path,
            ));
        }
    }

    for mention in find_mentions(store, paths, entity).await? {
        let to_type = match mention.source_type {
            MentionSourceType::Meeting => EntityType::Meeting,
            _ => EntityType::Project,
        };
        out.push(edge(
            entity,
            util::file_stem(&mention.source_path),
            to_type,
            RelationshipType::MentionedIn,
            &mention.source_path,
        ));
    }

    Ok(out)
}

fn edge(
    entity: &ResolvedEntity,
    to: String,
    to_type: EntityType,
    relationship: RelationshipType,
    evidence: &Path,
) -> EntityRelationship {
    EntityRelationship {
        from: entity.name.clone(),
        from_type: entity.entity_type,
        to,
        to_type,
        relationship,
        evidence: Some(evidence.display().to_string()),
    }
}

/// Strip list bullets and bold markers from a body line.
fn plain_line(line: &str) -> String {
    line.trim()
        .trim_start_matches(&['-', '*', '+'][..])
        .trim()
        .replace("**", "")
}

fn project_lists_member(doc: &Document, needles: &[String]) -> bool {
    for key in ["owner", "team"] {
        if let Some(value) = doc.get_joined(key) {
            if contains_any(&value, needles) {
                return true;
            }
        }
    }

    let mut in_team_section = false;
    for line in doc.body.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            in_team_section = trimmed
                .trim_start_matches('#')
                .trim()
                .eq_ignore_ascii_case("team");
            continue;
        }
        if in_team_section && contains_any(trimmed, needles) {
            return true;
        }
        let plain = plain_line(trimmed).to_lowercase();
        let labelled = ["owner:", "lead:", "team:"]
            .iter()
            .any(|label| plain.starts_with(label));
        if labelled && contains_any(&plain, needles) {
            return true;
        }
    }
    false
}

fn meeting_lists_attendee(doc: &Document, needles: &[String], slug: &str, name_slug: &str) -> bool {
    if let Some(attendees) = doc.get_joined("attendees") {
        if contains_any(&attendees, needles) {
            return true;
        }
    }

    let slugs: Vec<String> = [slug, name_slug]
        .iter()
        .map(|s| s.to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    let id_match = doc.get_list("attendee_ids").iter().any(|id| {
        let id = id.to_lowercase();
        slugs.iter().any(|s| id == *s || id.contains(s.as_str())) || contains_any(&id, needles)
    });
    if id_match {
        return true;
    }

    doc.body.lines().any(|line| {
        let plain = plain_line(line).to_lowercase();
        plain.starts_with("attendees:") && contains_any(&plain, needles)
    })
}
