//! Fuzzy name scoring shared by the resolver and mention finder.
//!
//! Same shape as the calendar title matcher: normalize both sides, then walk
//! an ordered list of rules where the first rule that applies decides the
//! score. Callers combining several fields take the max, never the sum.

/// Lowercase, keep only letters/digits/spaces, collapse whitespace, trim.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized words of `s`.
pub fn words(s: &str) -> Vec<String> {
    normalize(s)
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

/// Slug form of an already-normalized string: internal spaces become hyphens.
fn slug_form(normalized: &str) -> String {
    normalized.replace(' ', "-")
}

fn word_matches(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Similarity of `candidate` to `reference`, 0–100.
pub fn score(reference: &str, candidate: &str) -> u32 {
    let r = normalize(reference);
    let c = normalize(candidate);

    if r.is_empty() || c.is_empty() {
        return 0;
    }
    if r == c {
        return 100;
    }
    if slug_form(&r) == slug_form(&c) {
        return 90;
    }
    if c.starts_with(&r) {
        return 70;
    }
    if r.starts_with(&c) {
        return 60;
    }

    let ref_words: Vec<&str> = r.split(' ').collect();
    let cand_words: Vec<&str> = c.split(' ').collect();
    let matched = ref_words
        .iter()
        .filter(|rw| cand_words.iter().any(|cw| word_matches(rw, cw)))
        .count();

    if matched == ref_words.len() {
        50
    } else {
        (matched as u32 * 10).min(100)
    }
}
