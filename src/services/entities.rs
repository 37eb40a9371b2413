// Entity service: one handle over the content store and optional search assist.
// Business logic lives in the feature modules; this layer only wires
// collaborators through so callers hold a single value.

use std::sync::Arc;

use crate::entity::EntityQuery;
use crate::error::Result;
use crate::intelligence::{self, Candidate, Digest, Snapshot, SuggestOptions};
use crate::mentions;
use crate::people;
use crate::resolver;
use crate::search::SearchAssist;
use crate::signals::{self, RefreshOptions, RefreshResult};
use crate::storage::{ContentStore, FileStore};
use crate::types::{EntityMention, EntityRelationship, Person, PersonCategory, ResolvedEntity};
use crate::workspace::WorkspacePaths;

#[derive(Clone)]
pub struct EntityService {
    store: Arc<dyn ContentStore>,
    search: Option<Arc<dyn SearchAssist>>,
    paths: WorkspacePaths,
}

impl EntityService {
    pub fn new(store: Arc<dyn ContentStore>, paths: WorkspacePaths) -> Self {
        Self {
            store,
            search: None,
            paths,
        }
    }

    /// Service over the local filesystem at `root` with the standard layout.
    pub fn for_workspace(root: impl Into<std::path::PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new()), WorkspacePaths::new(root))
    }

    pub fn with_search(mut self, search: Arc<dyn SearchAssist>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    pub async fn resolve(
        &self,
        reference: &str,
        query: EntityQuery,
    ) -> Result<Option<ResolvedEntity>> {
        resolver::resolve(self.store.as_ref(), &self.paths, reference, query).await
    }

    pub async fn resolve_all(
        &self,
        reference: &str,
        query: EntityQuery,
        limit: usize,
    ) -> Result<Vec<ResolvedEntity>> {
        resolver::resolve_all(self.store.as_ref(), &self.paths, reference, query, limit).await
    }

    pub async fn find_mentions(&self, entity: &ResolvedEntity) -> Result<Vec<EntityMention>> {
        mentions::find_mentions(self.store.as_ref(), &self.paths, entity).await
    }

    pub async fn get_relationships(
        &self,
        entity: &ResolvedEntity,
    ) -> Result<Vec<EntityRelationship>> {
        mentions::get_relationships(self.store.as_ref(), &self.paths, entity).await
    }

    // =========================================================================
    // People
    // =========================================================================

    pub async fn list_people(&self, category: Option<PersonCategory>) -> Result<Vec<Person>> {
        people::list_people(self.store.as_ref(), &self.paths, category).await
    }

    pub async fn get_person_by_slug(
        &self,
        category: PersonCategory,
        slug: &str,
    ) -> Result<Option<Person>> {
        people::get_person_by_slug(self.store.as_ref(), &self.paths, category, slug).await
    }

    pub async fn get_person_by_email(&self, email: &str) -> Result<Option<Person>> {
        people::get_person_by_email(self.store.as_ref(), &self.paths, email).await
    }

    pub async fn show_person(&self, slug_or_email: &str) -> Result<Option<Person>> {
        people::show_person(self.store.as_ref(), &self.paths, slug_or_email).await
    }

    pub async fn build_people_index(&self) -> Result<usize> {
        people::build_people_index(self.store.as_ref(), &self.paths).await
    }

    // =========================================================================
    // Classification
    // =========================================================================

    pub async fn suggest(&self, candidates: &[Candidate], options: &SuggestOptions) -> Result<Digest> {
        intelligence::suggest(self.store.as_ref(), &self.paths, candidates, options).await
    }

    pub async fn recent_snapshots(&self, limit: usize) -> Result<Vec<Snapshot>> {
        intelligence::get_recent_snapshots(self.store.as_ref(), &self.paths, limit).await
    }

    // =========================================================================
    // Person memory
    // =========================================================================

    pub async fn refresh_person_memory(&self, options: &RefreshOptions) -> Result<RefreshResult> {
        signals::refresh_person_memory(
            self.store.as_ref(),
            &self.paths,
            self.search.as_deref(),
            options,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::error::IntelError;
    use crate::intelligence::RecommendedCategory;
    use crate::search::SearchHit;
    use crate::storage::MemoryStore;
    use crate::types::RelationshipType;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct FailingSearch;

    #[async_trait]
    impl SearchAssist for FailingSearch {
        async fn semantic_search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchHit>> {
            Err(IntelError::Search("index offline".to_string()))
        }
    }

    fn seeded() -> (Arc<MemoryStore>, EntityService) {
        let store = Arc::new(MemoryStore::new());
        store.insert(
            "/ws/people/internal/jane-doe.md",
            "---\nname: \"Jane Doe\"\nemail: \"jane@acme.com\"\nrole: \"VP Sales\"\n---\n\n# Jane Doe\n",
        );
        store.insert(
            "/ws/resources/meetings/2026-02-10-sync.md",
            "---\ntitle: \"Status Sync\"\ndate: \"2026-02-10\"\nattendees: \"Jane Doe, Bob Smith\"\n---\n\nJane Doe asked about the renewal date.\n",
        );
        store.insert(
            "/ws/resources/meetings/2026-02-12-review.md",
            "---\ntitle: \"Pricing Review\"\ndate: \"2026-02-12\"\nattendees: \"Jane Doe\"\n---\n\nJane Doe asked about the renewal date.\n",
        );
        let service = EntityService::new(store.clone(), WorkspacePaths::new("/ws"));
        (store, service)
    }

    #[tokio::test]
    async fn test_resolve_and_relate() {
        let (_store, service) = seeded();
        let jane = service
            .resolve("jane", EntityQuery::from(EntityType::Person))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(jane.slug, "jane-doe");
        assert!(jane.score >= 70);

        let relationships = service.get_relationships(&jane).await.unwrap();
        let attended = relationships
            .iter()
            .filter(|r| r.relationship == RelationshipType::Attended)
            .count();
        assert_eq!(attended, 2);

        let mentions = service.find_mentions(&jane).await.unwrap();
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].date.as_deref(), Some("2026-02-12"));
    }

    #[tokio::test]
    async fn test_people_lookups() {
        let (store, service) = seeded();
        let by_email = service.show_person("JANE@acme.com").await.unwrap().unwrap();
        assert_eq!(by_email.name, "Jane Doe");
        assert!(service.show_person("nobody").await.unwrap().is_none());

        assert_eq!(service.build_people_index().await.unwrap(), 1);
        let index = store
            .read(&service.paths().people_index())
            .await
            .unwrap()
            .unwrap();
        assert!(index.contains("| Jane Doe | internal | jane@acme.com | VP Sales | — |"));
    }

    #[tokio::test]
    async fn test_suggest_records_snapshot() {
        let (_store, service) = seeded();
        let candidates = vec![Candidate {
            name: Some("Sam Lee".to_string()),
            email: Some("sam@acme.com".to_string()),
            ..Default::default()
        }];
        let options = SuggestOptions {
            internal_domains: vec!["acme.com".to_string()],
            ..Default::default()
        };
        let digest = service.suggest(&candidates, &options).await.unwrap();
        assert_eq!(digest.total_candidates, 1);
        assert_eq!(
            digest.suggestions[0].recommendation.category,
            RecommendedCategory::Internal
        );

        let snapshots = service.recent_snapshots(10).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].total_candidates, 1);
    }

    #[tokio::test]
    async fn test_refresh_survives_search_failure() {
        let (store, service) = seeded();
        let service = service.with_search(Arc::new(FailingSearch));
        let options = RefreshOptions {
            today: NaiveDate::from_ymd_opt(2026, 2, 15),
            ..Default::default()
        };
        let result = service.refresh_person_memory(&options).await.unwrap();
        assert_eq!(result.updated, 1);
        assert_eq!(result.scanned_meetings, 2);

        let content = store
            .read(std::path::Path::new("/ws/people/internal/jane-doe.md"))
            .await
            .unwrap()
            .unwrap();
        assert!(content.contains("**the renewal date** — mentioned 2 times"));
    }
}
