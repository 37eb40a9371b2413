//! Refresh the memory highlights of each person from meetings and conversations.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frontmatter::Document;
use crate::people;
use crate::search::SearchAssist;
use crate::storage::{ContentStore, ListOptions};
use crate::types::Person;
use crate::util;
use crate::workspace::WorkspacePaths;

use super::aggregate::{aggregate, DEFAULT_MIN_MENTIONS};
use super::extract::{extract_signals, speaks_in, PersonMemorySignal};
use super::section::{last_refreshed, render_section, upsert_section};

/// Page size requested from the search assist. A full page means the hit
/// list may be truncated, so the full meeting list is used instead.
pub const SEARCH_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOptions {
    /// Only refresh this person (matched by slug).
    #[serde(default)]
    pub person_slug: Option<String>,
    #[serde(default = "default_min_mentions")]
    pub min_mentions: usize,
    /// Skip people refreshed fewer than this many days ago. Unset or ≤ 0 refreshes everyone.
    #[serde(default)]
    pub if_stale_days: Option<i64>,
    /// Override for the current date (defaults to the local date).
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

fn default_min_mentions() -> usize {
    DEFAULT_MIN_MENTIONS
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            person_slug: None,
            min_mentions: DEFAULT_MIN_MENTIONS,
            if_stale_days: None,
            today: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResult {
    pub updated: usize,
    pub scanned_people: usize,
    pub scanned_meetings: usize,
    pub skipped_fresh: usize,
    pub scanned_conversations: usize,
}

/// Whether a person file is due for regeneration.
pub fn is_stale(content: &str, if_stale_days: Option<i64>, today: NaiveDate) -> bool {
    let Some(days) = if_stale_days.filter(|d| *d > 0) else {
        return true;
    };
    match last_refreshed(content) {
        Some(stamp) => (today - stamp).num_days() >= days,
        None => true,
    }
}

/// Meeting and conversation contents read during one refresh, keyed by
/// normalized absolute path so listing and search paths share entries.
struct DocumentCache<'a> {
    store: &'a dyn ContentStore,
    paths: &'a WorkspacePaths,
    contents: HashMap<PathBuf, Option<String>>,
}

impl<'a> DocumentCache<'a> {
    fn new(store: &'a dyn ContentStore, paths: &'a WorkspacePaths) -> Self {
        Self {
            store,
            paths,
            contents: HashMap::new(),
        }
    }

    async fn get(&mut self, path: &Path) -> Result<Option<&str>> {
        let key = self.paths.normalize(path);
        if !self.contents.contains_key(&key) {
            let content = self.store.read(path).await?;
            self.contents.insert(key.clone(), content);
        } else {
            log::debug!("Cache hit: {}", key.display());
        }
        Ok(self.contents.get(&key).and_then(|c| c.as_deref()))
    }

    /// Documents under `dir` that were actually read.
    fn read_count_within(&self, dir: &Path) -> usize {
        let dir = self.paths.normalize(dir);
        self.contents
            .iter()
            .filter(|(k, c)| c.is_some() && k.starts_with(&dir))
            .count()
    }
}

/// Meeting files worth reading for `person`. Search hits narrow the list
/// only when they are trustworthy; otherwise every meeting is returned.
async fn candidate_meetings(
    search: Option<&dyn SearchAssist>,
    paths: &WorkspacePaths,
    person: &Person,
    meetings: &[PathBuf],
) -> Vec<PathBuf> {
    let Some(search) = search else {
        return meetings.to_vec();
    };

    let hits = match search.semantic_search(&person.name, SEARCH_LIMIT).await {
        Ok(hits) => hits,
        Err(e) => {
            log::warn!("Search assist failed for {}: {}; scanning all meetings", person.slug, e);
            return meetings.to_vec();
        }
    };
    if hits.is_empty() || hits.len() >= SEARCH_LIMIT {
        log::debug!(
            "Search returned {} hit(s) for {}; scanning all meetings",
            hits.len(),
            person.slug
        );
        return meetings.to_vec();
    }

    let hit_paths: HashSet<PathBuf> = hits.iter().map(|h| paths.normalize(&h.path)).collect();
    let narrowed: Vec<PathBuf> = meetings
        .iter()
        .filter(|m| hit_paths.contains(&paths.normalize(m)))
        .cloned()
        .collect();
    if narrowed.is_empty() {
        return meetings.to_vec();
    }
    narrowed
}

/// True if the document involves the person: listed in `attendee_ids`,
/// named in `attendees`, named in the body, or speaking in it.
fn person_in_document(doc: &Document, person: &Person) -> bool {
    let slug = person.slug.to_lowercase();
    if doc
        .get_list("attendee_ids")
        .iter()
        .any(|id| id.trim().to_lowercase() == slug)
    {
        return true;
    }
    let name = person.name.trim().to_lowercase();
    if name.is_empty() {
        return false;
    }
    if doc
        .get_joined("attendees")
        .is_some_and(|a| a.to_lowercase().contains(&name))
    {
        return true;
    }
    doc.body.to_lowercase().contains(&name) || speaks_in(&doc.body, &person.name)
}

fn signals_from(path: &Path, content: &str, person: &Person) -> Vec<PersonMemorySignal> {
    let doc = Document::parse(content);
    if !person_in_document(&doc, person) {
        return Vec::new();
    }
    let date = doc
        .get_str("date")
        .and_then(|d| util::date_token(&d))
        .or_else(|| util::date_token(&util::file_name(path)))
        .unwrap_or_default();
    extract_signals(&doc.body, &person.name, &date, &util::file_name(path))
}

/// Regenerate the memory highlights of every targeted person.
pub async fn refresh_person_memory(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    search: Option<&dyn SearchAssist>,
    options: &RefreshOptions,
) -> Result<RefreshResult> {
    let today = options.today.unwrap_or_else(|| Local::now().date_naive());
    let mut result = RefreshResult::default();

    let mut targets = people::list_people(store, paths, None).await?;
    if let Some(ref slug) = options.person_slug {
        targets.retain(|p| p.slug == *slug);
    }

    let meetings: Vec<PathBuf> = store
        .list(&paths.meetings, &ListOptions::markdown())
        .await?
        .into_iter()
        .filter(|p| !util::is_index_file(p))
        .collect();
    let conversations: Vec<PathBuf> = store
        .list(&paths.conversations, &ListOptions::markdown())
        .await?
        .into_iter()
        .filter(|p| !util::is_index_file(p))
        .collect();

    let mut cache = DocumentCache::new(store, paths);

    for person in &targets {
        result.scanned_people += 1;
        let person_path = paths.person_file(person.category, &person.slug);
        let Some(current) = store.read(&person_path).await? else {
            continue;
        };
        if !is_stale(&current, options.if_stale_days, today) {
            log::debug!("Skipping {}: memory refreshed recently", person.slug);
            result.skipped_fresh += 1;
            continue;
        }

        let mut signals = Vec::new();
        for path in candidate_meetings(search, paths, person, &meetings).await {
            if let Some(content) = cache.get(&path).await? {
                signals.extend(signals_from(&path, content, person));
            }
        }
        for path in &conversations {
            if let Some(content) = cache.get(path).await? {
                signals.extend(signals_from(path, content, person));
            }
        }

        let aggregated = aggregate(&signals, options.min_mentions);
        let updated = upsert_section(&current, &render_section(&aggregated, today));
        if updated != current {
            store.write(&person_path, &updated).await?;
            result.updated += 1;
            log::debug!(
                "Updated memory for {}: {} ask(s), {} concern(s)",
                person.slug,
                aggregated.asks.len(),
                aggregated.concerns.len()
            );
        }
    }

    result.scanned_meetings = cache.read_count_within(&paths.meetings);
    result.scanned_conversations = cache.read_count_within(&paths.conversations);

    log::info!(
        "Person memory refresh: {} updated, {} people scanned, {} skipped as fresh, {} meetings, {} conversations",
        result.updated,
        result.scanned_people,
        result.skipped_fresh,
        result.scanned_meetings,
        result.scanned_conversations
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntelError;
    use crate::search::SearchHit;
    use crate::signals::section::{extract_memory_section, MEMORY_START};
    use crate::storage::{FileStore, MemoryStore};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn write_person(root: &Path, slug: &str, name: &str) -> PathBuf {
        let dir = root.join("people/internal");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}.md", slug));
        fs::write(
            &path,
            format!(
                "---\nname: \"{}\"\ncategory: \"internal\"\n---\n\n# {}\n\n## Notes\n\n- Existing note.\n",
                name, name
            ),
        )
        .unwrap();
        path
    }

    fn write_meeting(root: &Path, file: &str, content: &str) {
        let dir = root.join("resources/meetings");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn options_on(today: &str) -> RefreshOptions {
        RefreshOptions {
            today: Some(day(today)),
            ..Default::default()
        }
    }

    const SYNC: &str = "---\ntitle: \"Status Sync\"\ndate: \"2026-02-10\"\nattendee_ids:\n  - jane-doe\n---\n\nJane Doe asked about timeline risk for launch.\nJane Doe is concerned about budget runway.\n";
    const REVIEW: &str = "---\ntitle: \"Review\"\ndate: \"2026-02-12\"\nattendee_ids:\n  - jane-doe\n---\n\nJane Doe asked about timeline risk for launch.\nJane Doe is concerned about budget runway.\n";

    #[tokio::test]
    async fn test_writes_repeated_asks_and_concerns() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let person = write_person(root, "jane-doe", "Jane Doe");
        write_meeting(root, "2026-02-10-sync.md", SYNC);
        write_meeting(root, "2026-02-12-review.md", REVIEW);

        let paths = WorkspacePaths::new(root);
        let result = refresh_person_memory(&FileStore::new(), &paths, None, &options_on("2026-02-15"))
            .await
            .unwrap();
        assert_eq!(result.updated, 1);
        assert_eq!(result.scanned_people, 1);
        assert_eq!(result.scanned_meetings, 2);
        assert_eq!(result.skipped_fresh, 0);

        let content = fs::read_to_string(&person).unwrap();
        assert!(content.contains("- Existing note."));
        assert!(content.contains("## Memory Highlights (Auto)"));
        assert!(content.contains("Last refreshed: 2026-02-15"));
        assert!(content.contains(
            "- **timeline risk for launch** — mentioned 2 times (last: 2026-02-12; sources: 2026-02-10-sync.md, 2026-02-12-review.md)"
        ));
        assert!(content.contains("**budget runway** — mentioned 2 times"));
    }

    #[tokio::test]
    async fn test_speaker_scenario_counts_each_meeting_once() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let person = write_person(root, "jane-doe", "Jane Doe");
        write_meeting(
            root,
            "2026-03-01-pricing.md",
            "# Pricing\n\nJane: can we revisit pricing\nBob: sure\n",
        );
        write_meeting(
            root,
            "2026-03-05-followup.md",
            "# Follow-up\n\nJane: can we revisit pricing\n",
        );

        let paths = WorkspacePaths::new(root);
        refresh_person_memory(&FileStore::new(), &paths, None, &options_on("2026-03-06"))
            .await
            .unwrap();

        let content = fs::read_to_string(&person).unwrap();
        let section = extract_memory_section(&content).unwrap();
        assert!(section.contains(
            "- **revisit pricing** — mentioned 2 times (last: 2026-03-05; sources: 2026-03-01-pricing.md, 2026-03-05-followup.md)"
        ));
        assert_eq!(section.matches("2026-03-01-pricing.md").count(), 1);
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let person = write_person(root, "jane-doe", "Jane Doe");
        write_meeting(
            root,
            "2026-02-10-sync.md",
            "---\ntitle: \"Status Sync\"\ndate: \"2026-02-10\"\nattendee_ids:\n  - jane-doe\n---\n\nJane Doe asked about budget timeline.\nJane Doe asked about budget timeline.\n",
        );

        let paths = WorkspacePaths::new(root);
        let store = FileStore::new();
        let first = refresh_person_memory(&store, &paths, None, &options_on("2026-02-15"))
            .await
            .unwrap();
        let after_first = fs::read_to_string(&person).unwrap();
        let second = refresh_person_memory(&store, &paths, None, &options_on("2026-02-15"))
            .await
            .unwrap();
        let after_second = fs::read_to_string(&person).unwrap();

        assert_eq!(first.updated, 1);
        assert_eq!(second.updated, 0);
        assert_eq!(after_first, after_second);
        assert_eq!(after_second.matches(MEMORY_START).count(), 1);
        assert!(after_second.contains("**budget timeline** — mentioned 2 times"));
    }

    #[tokio::test]
    async fn test_staleness_gate() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_person(root, "jane-doe", "Jane Doe");
        write_meeting(root, "2026-02-10-sync.md", SYNC);
        let paths = WorkspacePaths::new(root);
        let store = FileStore::new();

        let stamped = day("2026-02-10");
        refresh_person_memory(&store, &paths, None, &options_on("2026-02-10"))
            .await
            .unwrap();

        let five_days = RefreshOptions {
            if_stale_days: Some(7),
            today: Some(stamped + Duration::days(5)),
            ..Default::default()
        };
        let skipped = refresh_person_memory(&store, &paths, None, &five_days)
            .await
            .unwrap();
        assert_eq!(skipped.skipped_fresh, 1);
        assert_eq!(skipped.updated, 0);
        assert_eq!(skipped.scanned_people, 1);
        assert_eq!(skipped.scanned_meetings, 0);

        let ten_days = RefreshOptions {
            if_stale_days: Some(7),
            today: Some(stamped + Duration::days(10)),
            ..Default::default()
        };
        let refreshed = refresh_person_memory(&store, &paths, None, &ten_days)
            .await
            .unwrap();
        assert_eq!(refreshed.skipped_fresh, 0);
        assert_eq!(refreshed.updated, 1);
    }

    #[test]
    fn test_is_stale_rules() {
        let today = day("2026-02-20");
        let fresh = "<!-- AUTO_PERSON_MEMORY:START -->\nLast refreshed: 2026-02-18\n<!-- AUTO_PERSON_MEMORY:END -->";
        assert!(!is_stale(fresh, Some(7), today));
        assert!(is_stale(fresh, None, today));
        assert!(is_stale(fresh, Some(0), today));
        assert!(is_stale(fresh, Some(-3), today));
        assert!(is_stale(fresh, Some(2), today));
        assert!(is_stale("# No section", Some(7), today));
    }

    #[tokio::test]
    async fn test_person_slug_filter() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_person(root, "jane-doe", "Jane Doe");
        let bob = write_person(root, "bob-smith", "Bob Smith");
        write_meeting(root, "2026-02-10-sync.md", SYNC);
        let paths = WorkspacePaths::new(root);

        let options = RefreshOptions {
            person_slug: Some("jane-doe".to_string()),
            today: Some(day("2026-02-15")),
            ..Default::default()
        };
        let result = refresh_person_memory(&FileStore::new(), &paths, None, &options)
            .await
            .unwrap();
        assert_eq!(result.scanned_people, 1);
        assert_eq!(result.updated, 1);
        assert!(!fs::read_to_string(&bob).unwrap().contains(MEMORY_START));
    }

    #[tokio::test]
    async fn test_conversations_always_scanned() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let person = write_person(root, "jane-doe", "Jane Doe");
        let conv = root.join("resources/conversations");
        fs::create_dir_all(&conv).unwrap();
        fs::write(
            conv.join("2026-02-01-slack.md"),
            "Jane Doe pushed back on the migration plan.\n",
        )
        .unwrap();
        fs::write(
            conv.join("2026-02-03-email.md"),
            "Jane Doe pushed back on the migration plan.\n",
        )
        .unwrap();

        let paths = WorkspacePaths::new(root);
        let search = ScriptedSearch::new(Ok(vec![]));
        let result = refresh_person_memory(
            &FileStore::new(),
            &paths,
            Some(&search),
            &options_on("2026-02-15"),
        )
        .await
        .unwrap();
        assert_eq!(result.scanned_conversations, 2);
        let content = fs::read_to_string(&person).unwrap();
        assert!(content.contains("**the migration plan** — mentioned 2 times"));
    }

    #[tokio::test]
    async fn test_relative_workspace_root() {
        let store = MemoryStore::new();
        store.insert(
            "ws/people/internal/jane-doe.md",
            "---\nname: \"Jane Doe\"\n---\n\n# Jane Doe\n",
        );
        for (file, date) in [("2026-03-01-pricing.md", "2026-03-01"), ("2026-03-05-followup.md", "2026-03-05")] {
            store.insert(
                format!("ws/resources/meetings/{}", file),
                format!(
                    "---\ndate: \"{}\"\nattendee_ids: [jane-doe]\n---\n\nJane: can we revisit pricing\n",
                    date
                ),
            );
        }

        let paths = WorkspacePaths::new("ws");
        let search = ScriptedSearch::new(Ok(vec![
            hit("resources/meetings/2026-03-01-pricing.md"),
            hit("ws/resources/meetings/2026-03-05-followup.md"),
        ]));
        let result = refresh_person_memory(&store, &paths, Some(&search), &options_on("2026-03-06"))
            .await
            .unwrap();
        assert_eq!(result.updated, 1);
        assert_eq!(result.scanned_meetings, 2);

        let content = store
            .read(Path::new("ws/people/internal/jane-doe.md"))
            .await
            .unwrap()
            .unwrap();
        assert!(content.contains("**revisit pricing** — mentioned 2 times (last: 2026-03-05"));
        assert!(!content.contains("None detected yet.\n\n### Repeated concerns"));
    }

    // -------------------------------------------------------------------------
    // Search assist
    // -------------------------------------------------------------------------

    struct ScriptedSearch {
        response: Mutex<Option<Result<Vec<SearchHit>>>>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedSearch {
        fn new(response: Result<Vec<SearchHit>>) -> Self {
            Self {
                response: Mutex::new(Some(response)),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchAssist for ScriptedSearch {
        async fn semantic_search(&self, query: &str, _limit: usize) -> Result<Vec<SearchHit>> {
            self.queries.lock().unwrap().push(query.to_string());
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn hit(path: &str) -> SearchHit {
        SearchHit {
            path: PathBuf::from(path),
            score: 0.9,
        }
    }

    fn search_workspace() -> (TempDir, WorkspacePaths, PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let person = write_person(&root, "jane-doe", "Jane Doe");
        write_meeting(&root, "2026-02-10-sync.md", SYNC);
        write_meeting(&root, "2026-02-12-review.md", REVIEW);
        write_meeting(&root, "2026-02-13-unrelated.md", "# Unrelated\n\nNothing here.\n");
        let paths = WorkspacePaths::new(&root);
        (temp, paths, person)
    }

    #[tokio::test]
    async fn test_search_hits_narrow_meetings() {
        let (_temp, paths, _person) = search_workspace();
        // Relative paths resolve against the workspace root.
        let search = ScriptedSearch::new(Ok(vec![
            hit("resources/meetings/2026-02-10-sync.md"),
            hit("resources/meetings/./2026-02-12-review.md"),
        ]));
        let result = refresh_person_memory(
            &FileStore::new(),
            &paths,
            Some(&search),
            &options_on("2026-02-15"),
        )
        .await
        .unwrap();
        assert_eq!(result.scanned_meetings, 2);
        assert_eq!(result.updated, 1);
        assert_eq!(*search.queries.lock().unwrap(), vec!["Jane Doe".to_string()]);
    }

    #[tokio::test]
    async fn test_search_fallbacks_scan_everything() {
        let full_page: Vec<SearchHit> = (0..SEARCH_LIMIT)
            .map(|i| hit(&format!("resources/meetings/other-{}.md", i)))
            .collect();
        let cases: Vec<Result<Vec<SearchHit>>> = vec![
            Ok(Vec::new()),
            Ok(full_page),
            Ok(vec![hit("/elsewhere/not-a-meeting.md")]),
            Err(IntelError::Search("index offline".to_string())),
        ];

        for response in cases {
            let (_temp, paths, person) = search_workspace();
            let search = ScriptedSearch::new(response);
            let result = refresh_person_memory(
                &FileStore::new(),
                &paths,
                Some(&search),
                &options_on("2026-02-15"),
            )
            .await
            .unwrap();
            assert_eq!(result.scanned_meetings, 3);
            assert_eq!(result.updated, 1);
            assert!(fs::read_to_string(&person)
                .unwrap()
                .contains("**timeline risk for launch** — mentioned 2 times"));
        }
    }
}
