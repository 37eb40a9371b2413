//! People directory: one markdown file per person under
//! `people/{internal,customers,users}/`.
//!
//! A file is a person only if its frontmatter carries a `name`; the
//! generated `index.md` is never read as a person.

use std::path::Path;

use crate::error::Result;
use crate::frontmatter::Document;
use crate::storage::{ContentStore, ListOptions};
use crate::types::{Person, PersonCategory, PEOPLE_CATEGORIES};
use crate::util;
use crate::workspace::WorkspacePaths;

pub use crate::util::slugify_person_name;

const INDEX_HEADER: &str = "# People Index\n\n\
People you work with: internal colleagues, customers, and users.\n\n\
| Name | Category | Email | Role | Company / Team |\n\
|------|----------|-------|------|----------------|\n";

const INDEX_EMPTY_ROW: &str = "| (none yet) | — | — | — | — |\n";

const INDEX_FOOTER: &str = "\nAdd person files under `people/internal/`, `people/customers/`, or \
`people/users/` (e.g. `people/internal/jane-doe.md`).\n";

/// Parse a person file. Returns `None` when the frontmatter has no `name`.
pub fn parse_person(path: &Path, content: &str, category: PersonCategory) -> Option<Person> {
    let doc = Document::parse(content);
    let name = doc.get_str("name")?;
    Some(Person {
        slug: util::file_stem(path),
        name,
        email: doc.get_str("email"),
        role: doc.get_str("role"),
        company: doc.get_str("company"),
        team: doc.get_str("team"),
        category,
    })
}

async fn list_category(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    category: PersonCategory,
) -> Result<Vec<Person>> {
    let dir = paths.people_category(category);
    let mut people = Vec::new();
    for path in store.list(&dir, &ListOptions::markdown()).await? {
        if util::is_index_file(&path) {
            continue;
        }
        let Some(content) = store.read(&path).await? else {
            continue;
        };
        match parse_person(&path, &content, category) {
            Some(person) => people.push(person),
            None => log::debug!("Skipping {}: no frontmatter name", path.display()),
        }
    }
    Ok(people)
}

/// All people (or one category), sorted by name.
pub async fn list_people(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    category: Option<PersonCategory>,
) -> Result<Vec<Person>> {
    let categories: Vec<PersonCategory> = match category {
        Some(c) => vec![c],
        None => PEOPLE_CATEGORIES.to_vec(),
    };
    let mut people = Vec::new();
    for c in categories {
        people.extend(list_category(store, paths, c).await?);
    }
    people.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(people)
}

pub async fn get_person_by_slug(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    category: PersonCategory,
    slug: &str,
) -> Result<Option<Person>> {
    let path = paths.person_file(category, slug);
    Ok(store
        .read(&path)
        .await?
        .and_then(|content| parse_person(&path, &content, category)))
}

/// Case-insensitive email lookup; categories are searched internal first.
pub async fn get_person_by_email(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    email: &str,
) -> Result<Option<Person>> {
    let wanted = email.trim().to_lowercase();
    if wanted.is_empty() {
        return Ok(None);
    }
    for category in PEOPLE_CATEGORIES {
        let found = list_category(store, paths, category)
            .await?
            .into_iter()
            .find(|p| {
                p.email
                    .as_deref()
                    .is_some_and(|e| e.trim().to_lowercase() == wanted)
            });
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

/// Look a person up by email (if the key contains `@`) or by slug in any category.
pub async fn show_person(
    store: &dyn ContentStore,
    paths: &WorkspacePaths,
    slug_or_email: &str,
) -> Result<Option<Person>> {
    let key = slug_or_email.trim();
    if key.contains('@') {
        return get_person_by_email(store, paths, key).await;
    }
    for category in PEOPLE_CATEGORIES {
        if let Some(person) = get_person_by_slug(store, paths, category, key).await? {
            return Ok(Some(person));
        }
    }
    Ok(None)
}

fn cell(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.replace('|', "\\|"),
        None => "—".to_string(),
    }
}

fn render_index(people: &[Person]) -> String {
    let mut out = String::from(INDEX_HEADER);
    if people.is_empty() {
        out.push_str(INDEX_EMPTY_ROW);
    }
    for person in people {
        let org = match (person.company.as_deref(), person.team.as_deref()) {
            (Some(company), Some(team)) => Some(format!("{} / {}", company, team)),
            (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
            (None, None) => None,
        };
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            cell(Some(&person.name)),
            person.category.as_str(),
            cell(person.email.as_deref()),
            cell(person.role.as_deref()),
            cell(org.as_deref()),
        ));
    }
    out.push_str(INDEX_FOOTER);
    out
}

/// Regenerate `people/index.md`. Returns the number of people listed.
pub async fn build_people_index(store: &dyn ContentStore, paths: &WorkspacePaths) -> Result<usize> {
    let people = list_people(store, paths, None).await?;
    store.write(&paths.people_index(), &render_index(&people)).await?;
    log::info!("Updated people index with {} person(s)", people.len());
    Ok(people.len())
}
