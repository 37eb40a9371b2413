//! The generated memory block inside a person file.
//!
//! The block lives between two marker lines and is always regenerated as a
//! whole. Text outside the markers belongs to the user and is never touched.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use super::aggregate::{AggregatedPersonSignal, AggregatedSignals};

pub const MEMORY_START: &str = "<!-- AUTO_PERSON_MEMORY:START -->";
pub const MEMORY_END: &str = "<!-- AUTO_PERSON_MEMORY:END -->";
pub const MEMORY_HEADER: &str = "## Memory Highlights (Auto)";

/// Topics rendered per kind.
pub const MAX_RENDERED_TOPICS: usize = 8;
/// Source file names listed per topic.
pub const MAX_RENDERED_SOURCES: usize = 3;

fn re_last_refreshed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Last refreshed:\s*(\d{4}-\d{2}-\d{2})").unwrap())
}

/// Byte range of the marked block, markers included.
fn block_range(content: &str) -> Option<(usize, usize)> {
    let start = content.find(MEMORY_START)?;
    let end_rel = content[start..].find(MEMORY_END)?;
    Some((start, start + end_rel + MEMORY_END.len()))
}

/// Trimmed text between the markers, or `None` if absent or empty.
pub fn extract_memory_section(content: &str) -> Option<String> {
    let (start, end) = block_range(content)?;
    let inner = content[start + MEMORY_START.len()..end - MEMORY_END.len()].trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

/// Date stamped in the marked block, if present and valid.
pub fn last_refreshed(content: &str) -> Option<NaiveDate> {
    let section = extract_memory_section(content)?;
    let caps = re_last_refreshed().captures(&section)?;
    NaiveDate::parse_from_str(caps.get(1)?.as_str(), "%Y-%m-%d").ok()
}

fn render_items(out: &mut String, items: &[AggregatedPersonSignal]) {
    if items.is_empty() {
        out.push_str("- None detected yet.\n");
        return;
    }
    for item in items.iter().take(MAX_RENDERED_TOPICS) {
        let last = if item.last_mentioned.is_empty() {
            "unknown"
        } else {
            item.last_mentioned.as_str()
        };
        let sources: Vec<&str> = item
            .sources
            .iter()
            .take(MAX_RENDERED_SOURCES)
            .map(String::as_str)
            .collect();
        out.push_str(&format!(
            "- **{}** — mentioned {} times (last: {}; sources: {})\n",
            item.topic,
            item.count,
            last,
            sources.join(", ")
        ));
    }
}

/// The full marked block for `signals`, stamped with `today`.
pub fn render_section(signals: &AggregatedSignals, today: NaiveDate) -> String {
    let mut out = String::new();
    out.push_str(MEMORY_START);
    out.push('\n');
    out.push_str(MEMORY_HEADER);
    out.push_str("\n\n");
    out.push_str(&format!("Last refreshed: {}\n\n", today.format("%Y-%m-%d")));
    out.push_str("### Repeated asks\n");
    render_items(&mut out, &signals.asks);
    out.push_str("\n### Repeated concerns\n");
    render_items(&mut out, &signals.concerns);
    out.push_str(MEMORY_END);
    out
}

/// Replace the existing block, or append one at the end of the document.
pub fn upsert_section(content: &str, section: &str) -> String {
    match block_range(content) {
        Some((start, end)) => format!("{}{}{}", &content[..start], section, &content[end..]),
        None => {
            let body = content.trim_end();
            if body.is_empty() {
                format!("{}\n", section)
            } else {
                format!("{}\n\n{}\n", body, section)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> AggregatedSignals {
        AggregatedSignals {
            asks: vec![AggregatedPersonSignal {
                topic: "revisit pricing".to_string(),
                count: 2,
                last_mentioned: "2026-02-12".to_string(),
                sources: vec!["a.md".to_string(), "b.md".to_string()],
            }],
            concerns: Vec::new(),
        }
    }

    #[test]
    fn test_render_section() {
        let section = render_section(&sample(), day("2026-02-15"));
        assert!(section.starts_with(MEMORY_START));
        assert!(section.ends_with(MEMORY_END));
        assert!(section.contains("## Memory Highlights (Auto)"));
        assert!(section.contains("Last refreshed: 2026-02-15"));
        assert!(section.contains(
            "- **revisit pricing** — mentioned 2 times (last: 2026-02-12; sources: a.md, b.md)"
        ));
        assert!(section.contains("### Repeated concerns\n- None detected yet."));
    }

    #[test]
    fn test_render_limits() {
        let asks: Vec<AggregatedPersonSignal> = (0..10)
            .map(|i| AggregatedPersonSignal {
                topic: format!("topic {}", i),
                count: 2,
                last_mentioned: String::new(),
                sources: vec!["a.md", "b.md", "c.md", "d.md"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            })
            .collect();
        let section = render_section(
            &AggregatedSignals {
                asks,
                concerns: Vec::new(),
            },
            day("2026-02-15"),
        );
        assert_eq!(section.matches("mentioned 2 times").count(), MAX_RENDERED_TOPICS);
        assert!(section.contains("(last: unknown; sources: a.md, b.md, c.md)"));
        assert!(!section.contains("d.md"));
    }

    #[test]
    fn test_upsert_appends_then_replaces() {
        let person = "---\nname: \"Jane Doe\"\n---\n\n# Jane Doe\n\n## Notes\n\n- Existing note.\n";
        let first = upsert_section(person, &render_section(&sample(), day("2026-02-15")));
        assert!(first.starts_with(person.trim_end()));
        assert_eq!(first.matches(MEMORY_START).count(), 1);

        let second = upsert_section(
            &first,
            &render_section(&AggregatedSignals::default(), day("2026-02-16")),
        );
        assert_eq!(second.matches(MEMORY_START).count(), 1);
        assert!(second.contains("- Existing note."));
        assert!(second.contains("Last refreshed: 2026-02-16"));
        assert!(!second.contains("revisit pricing"));
    }

    #[test]
    fn test_upsert_is_stable_for_identical_section() {
        let section = render_section(&sample(), day("2026-02-15"));
        let once = upsert_section("# Jane\n", &section);
        let twice = upsert_section(&once, &section);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_extract_and_last_refreshed() {
        let content = upsert_section("# Jane\n", &render_section(&sample(), day("2026-02-15")));
        let inner = extract_memory_section(&content).unwrap();
        assert!(inner.starts_with(MEMORY_HEADER));
        assert_eq!(last_refreshed(&content), Some(day("2026-02-15")));

        assert_eq!(extract_memory_section("# Jane\n"), None);
        assert_eq!(last_refreshed("Last refreshed: 2026-02-15"), None);
        let broken = format!("{}\nLast refreshed: 2026-13-45\n{}", MEMORY_START, MEMORY_END);
        assert_eq!(last_refreshed(&broken), None);
        assert_eq!(extract_memory_section(&format!("{}\n\n{}", MEMORY_START, MEMORY_END)), None);
    }
}
