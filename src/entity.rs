//! Workspace entity kinds.
//!
//! People, meetings, and projects are the three things a free-text reference
//! can resolve to. `EntityQuery` adds `Any` for lookups that should consider
//! all three.

use serde::{Deserialize, Serialize};

/// The kind of workspace entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Person,
    Meeting,
    Project,
}

impl EntityType {
    /// String label used in serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "person",
            EntityType::Meeting => "meeting",
            EntityType::Project => "project",
        }
    }

    /// Parse from a label, returning None for anything unrecognized.
    pub fn from_str_lossy(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "person" => Some(EntityType::Person),
            "meeting" => Some(EntityType::Meeting),
            "project" => Some(EntityType::Project),
            _ => None,
        }
    }
}

/// Which entity kinds a resolution call should consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityQuery {
    Person,
    Meeting,
    Project,
    Any,
}

impl EntityQuery {
    /// Candidate kinds in discovery order. `Any` unions person, meeting, project.
    pub fn kinds(&self) -> &'static [EntityType] {
        match self {
            EntityQuery::Person => &[EntityType::Person],
            EntityQuery::Meeting => &[EntityType::Meeting],
            EntityQuery::Project => &[EntityType::Project],
            EntityQuery::Any => &[EntityType::Person, EntityType::Meeting, EntityType::Project],
        }
    }
}

impl From<EntityType> for EntityQuery {
    fn from(t: EntityType) -> Self {
        match t {
            EntityType::Person => EntityQuery::Person,
            EntityType::Meeting => EntityQuery::Meeting,
            EntityType::Project => EntityQuery::Project,
        }
    }
}
