//! Shared data model for resolution, mentions, relationships, and people.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::EntityType;

/// A workspace entity matched against a free-text reference.
///
/// Produced fresh per resolution call. `score` (0–100) is only comparable
/// with other results of the same query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEntity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub path: PathBuf,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub score: u32,
}

/// Folder-backed category of a person file (`people/{category}/{slug}.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonCategory {
    Internal,
    Customers,
    Users,
}

/// Scan order for person categories.
pub const PEOPLE_CATEGORIES: [PersonCategory; 3] = [
    PersonCategory::Internal,
    PersonCategory::Customers,
    PersonCategory::Users,
];

impl PersonCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonCategory::Internal => "internal",
            PersonCategory::Customers => "customers",
            PersonCategory::Users => "users",
        }
    }

    pub fn from_str_lossy(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "internal" => Some(PersonCategory::Internal),
            "customers" => Some(PersonCategory::Customers),
            "users" => Some(PersonCategory::Users),
            _ => None,
        }
    }
}

/// Person record read from a person file's frontmatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub category: PersonCategory,
}

/// Which workspace area a mention was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionSourceType {
    Context,
    Meeting,
    Memory,
    Project,
    Conversation,
}

/// A document that references an entity by name or slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMention {
    pub entity: String,
    pub entity_type: EntityType,
    pub source_path: PathBuf,
    pub source_type: MentionSourceType,
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Typed edge between an entity and a project or meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    WorksOn,
    Attended,
    MentionedIn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRelationship {
    pub from: String,
    pub from_type: EntityType,
    pub to: String,
    pub to_type: EntityType,
    #[serde(rename = "type")]
    pub relationship: RelationshipType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}
