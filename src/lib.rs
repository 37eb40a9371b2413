//! Entity resolution, people classification, and person memory over a
//! markdown workspace.
//!
//! All workspace access goes through a [`storage::ContentStore`]; the
//! optional [`search::SearchAssist`] only narrows which meeting files are
//! read when mining person memory. [`services::EntityService`] bundles both
//! with the workspace layout.

pub mod entity;
mod error;
pub mod frontmatter;
pub mod intelligence;
pub mod matcher;
pub mod mentions;
pub mod people;
pub mod resolver;
pub mod search;
pub mod services;
pub mod signals;
pub mod storage;
pub mod types;
pub mod util;
pub mod workspace;

pub use entity::{EntityQuery, EntityType};
pub use error::{IntelError, Result};
pub use services::EntityService;
pub use storage::{ContentStore, FileStore, MemoryStore};
pub use workspace::WorkspacePaths;
