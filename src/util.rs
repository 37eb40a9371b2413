use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Convert a display name to a URL-safe kebab-case slug.
///
/// Example: "Acme Corp" → "acme-corp"
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Slug for a person file name.
///
/// Unlike [`slugify`], punctuation inside a word is dropped rather than
/// split on, so "Jane O'Brien" → "jane-obrien". Never returns an empty slug.
pub fn slugify_person_name(name: &str) -> String {
    let kept: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || c.is_whitespace())
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    let slug = kept
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "unnamed".to_string()
    } else {
        slug
    }
}

/// Lowercase a domain and strip a leading `www.`.
pub fn normalize_domain(domain: &str) -> String {
    let lower = domain.trim().to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// Normalize a list of domain strings: trim, lowercase, strip `www.`, dedupe, sort.
pub fn normalize_domains(domains: &[String]) -> Vec<String> {
    let mut out: Vec<String> = domains
        .iter()
        .map(|d| normalize_domain(d))
        .filter(|d| !d.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Extract the normalized domain of an email address.
///
/// Example: "Sarah@WWW.Acme.com" → Some("acme.com")
pub fn email_domain(email: &str) -> Option<String> {
    let (_, domain) = email.trim().rsplit_once('@')?;
    let domain = normalize_domain(domain);
    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}

/// Extract the normalized host of a website value.
///
/// Accepts full URLs ("https://www.acme.com/about") and bare hosts ("acme.com").
pub fn website_host(website: &str) -> Option<String> {
    let trimmed = website.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = url::Url::parse(trimmed)
        .or_else(|_| url::Url::parse(&format!("https://{}", trimmed)))
        .ok()?;
    parsed
        .host_str()
        .map(normalize_domain)
        .filter(|h| !h.is_empty())
}

fn re_date_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap())
}

/// First `YYYY-MM-DD` token in a string (file names, paths).
pub fn date_token(text: &str) -> Option<String> {
    re_date_token().find(text).map(|m| m.as_str().to_string())
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// File stem as an owned string ("2026-02-10-sync.md" → "2026-02-10-sync").
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// File name as an owned string.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// True for a directory's `index.md`, which is generated and never an entity.
pub fn is_index_file(path: &Path) -> bool {
    file_name(path).eq_ignore_ascii_case("index.md")
}
