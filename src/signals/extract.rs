//! Ask/concern extraction from meeting and conversation text.
//!
//! Extraction is a small rule table: each rule pairs a trigger pattern (with
//! the topic in capture group 1) with the signal kind it produces. Prose
//! rules run on every line; speaker rules also run on the utterance of a
//! `Speaker: utterance` line when the speaker is the person being mined.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matcher::normalize;
use crate::util;

pub const MAX_TOPIC_CHARS: usize = 120;
pub const MIN_TOPIC_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Ask,
    Concern,
}

/// One ask or concern attributed to a person in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonMemorySignal {
    pub kind: SignalKind,
    pub topic: String,
    /// `YYYY-MM-DD`, or empty when the document carries no date.
    pub date: String,
    /// File name of the source document.
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleScope {
    Prose,
    Speaker,
}

struct SignalRule {
    scope: RuleScope,
    kind: SignalKind,
    pattern: &'static str,
}

// Topic runs to the end of the sentence.
const SIGNAL_RULES: &[SignalRule] = &[
    SignalRule {
        scope: RuleScope::Prose,
        kind: SignalKind::Ask,
        pattern: r"(?i)\basked\s+(?:about|for|if)\s+([^.!?\n]+)",
    },
    SignalRule {
        scope: RuleScope::Prose,
        kind: SignalKind::Concern,
        pattern: r"(?i)\b(?:concerned|worried|skeptical)\s+about\s+([^.!?\n]+)",
    },
    SignalRule {
        scope: RuleScope::Prose,
        kind: SignalKind::Concern,
        pattern: r"(?i)\bpushed\s+back\s+on\s+([^.!?\n]+)",
    },
    SignalRule {
        scope: RuleScope::Speaker,
        kind: SignalKind::Ask,
        pattern: r"(?i)\b(?:can\s+we|could\s+we|what\s+about|how\s+about)\s+([^.!?\n]+)",
    },
    SignalRule {
        scope: RuleScope::Speaker,
        kind: SignalKind::Concern,
        pattern: r"(?i)\b(?:concerned|worried)\s+about\s+([^.!?\n]+)",
    },
];

fn compiled_rules() -> &'static [(&'static SignalRule, Regex)] {
    static RULES: OnceLock<Vec<(&'static SignalRule, Regex)>> = OnceLock::new();
    RULES.get_or_init(|| {
        SIGNAL_RULES
            .iter()
            .map(|rule| (rule, Regex::new(rule.pattern).unwrap()))
            .collect()
    })
}

fn re_speaker_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Recorder transcripts prefix the name with a `[hh:mm:ss]` stamp,
        // either inside or outside the bold markers.
        Regex::new(
            r"^\s*(?:[-*+]\s+)?(?:\[[^\]\n]*\]\s*)?(?:\*\*)?(?:\[[^\]\n]*\]\s*)?([A-Za-z][^:*\n]{0,59}?)(?:\*\*)?\s*:\s*(.+)$",
        )
        .unwrap()
    })
}

/// Split a `Speaker: utterance` line.
fn speaker_line(line: &str) -> Option<(&str, &str)> {
    let caps = re_speaker_line().captures(line)?;
    Some((caps.get(1)?.as_str().trim(), caps.get(2)?.as_str().trim()))
}

/// True if `speaker` names the person: the full name, or the first name alone.
fn is_person_speaker(speaker: &str, person_name: &str) -> bool {
    let speaker = normalize(speaker);
    let name = normalize(person_name);
    if speaker.is_empty() || name.is_empty() {
        return false;
    }
    if speaker.contains(&name) {
        return true;
    }
    name.split(' ').next().is_some_and(|first| first == speaker)
}

/// True if any `Speaker:` line in `body` is attributed to the person.
pub fn speaks_in(body: &str, person_name: &str) -> bool {
    body.lines()
        .filter_map(speaker_line)
        .any(|(speaker, _)| is_person_speaker(speaker, person_name))
}

/// Canonical topic text, or `None` if too short to be meaningful.
pub fn normalize_topic(raw: &str) -> Option<String> {
    let lower = raw.to_lowercase();
    let stripped = lower.trim_start_matches(|c: char| !c.is_alphanumeric());
    let kept: String = stripped
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ' || *c == '-')
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    let topic = util::truncate_chars(&collapsed, MAX_TOPIC_CHARS)
        .trim()
        .to_string();
    if topic.chars().count() < MIN_TOPIC_CHARS {
        None
    } else {
        Some(topic)
    }
}

fn apply_rules(
    text: &str,
    scope: RuleScope,
    line_start: usize,
    date: &str,
    source: &str,
    out: &mut Vec<PersonMemorySignal>,
) {
    for (rule, re) in compiled_rules().iter().filter(|(r, _)| r.scope == scope) {
        for caps in re.captures_iter(text) {
            let Some(topic) = caps.get(1).and_then(|m| normalize_topic(m.as_str())) else {
                continue;
            };
            // prose and speaker rules overlap on "worried about" in the person's own lines
            if out[line_start..]
                .iter()
                .any(|s| s.kind == rule.kind && s.topic == topic)
            {
                continue;
            }
            out.push(PersonMemorySignal {
                kind: rule.kind,
                topic,
                date: date.to_string(),
                source: source.to_string(),
            });
        }
    }
}

/// All asks and concerns in a document body attributed to `person_name`.
///
/// Every line is read as prose about the meeting, labels included. The
/// person's own `Speaker:` lines additionally get the first-person rules.
/// A topic is recorded at most once per kind and line.
pub fn extract_signals(
    body: &str,
    person_name: &str,
    date: &str,
    source: &str,
) -> Vec<PersonMemorySignal> {
    let mut out = Vec::new();
    for line in body.lines() {
        let line_start = out.len();
        apply_rules(line, RuleScope::Prose, line_start, date, source, &mut out);
        if let Some((speaker, utterance)) = speaker_line(line) {
            if is_person_speaker(speaker, person_name) {
                apply_rules(utterance, RuleScope::Speaker, line_start, date, source, &mut out);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(signals: &[PersonMemorySignal], kind: SignalKind) -> Vec<String> {
        signals
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.topic.clone())
            .collect()
    }

    #[test]
    fn test_prose_asks_and_concerns() {
        let body = "Jane Doe asked about timeline risk for launch.\n\
                    Jane Doe is concerned about budget runway.\n\
                    She pushed back on the Q3 hiring plan! Then asked for a demo.\n\
                    Team was skeptical about vendor lock-in";
        let signals = extract_signals(body, "Jane Doe", "2026-02-10", "sync.md");
        assert_eq!(
            topics(&signals, SignalKind::Ask),
            vec!["timeline risk for launch", "a demo"]
        );
        assert_eq!(
            topics(&signals, SignalKind::Concern),
            vec!["budget runway", "the q3 hiring plan", "vendor lock-in"]
        );
        assert!(signals.iter().all(|s| s.date == "2026-02-10" && s.source == "sync.md"));
    }

    #[test]
    fn test_speaker_lines() {
        let body = "Jane: can we revisit pricing?\n\
                    **Jane Doe:** I'm worried about churn in EMEA. Anyway.\n\
                    Bob: can we ship faster\n\
                    - Jane: how about a pilot";
        let signals = extract_signals(body, "Jane Doe", "2026-02-10", "a.md");
        assert_eq!(
            topics(&signals, SignalKind::Ask),
            vec!["revisit pricing", "a pilot"]
        );
        assert_eq!(topics(&signals, SignalKind::Concern), vec!["churn in emea"]);
    }

    #[test]
    fn test_label_prefixed_lines_are_prose() {
        let body = "Summary: Jane Doe asked about timeline risk for launch.\n\
                    Notes: Jane Doe is concerned about budget runway.";
        let signals = extract_signals(body, "Jane Doe", "2026-02-10", "sync.md");
        assert_eq!(
            topics(&signals, SignalKind::Ask),
            vec!["timeline risk for launch"]
        );
        assert_eq!(topics(&signals, SignalKind::Concern), vec!["budget runway"]);
    }

    #[test]
    fn test_own_lines_keep_prose_rules() {
        let body = "Jane: I'm skeptical about the rollout plan\n\
                    Jane Doe: we pushed back on the renewal terms";
        let signals = extract_signals(body, "Jane Doe", "", "x.md");
        assert_eq!(
            topics(&signals, SignalKind::Concern),
            vec!["the rollout plan", "the renewal terms"]
        );
    }

    #[test]
    fn test_first_person_rules_need_the_person_speaking() {
        let body = "Bob: can we ship faster\nBob: Jane asked about the roadmap.";
        let signals = extract_signals(body, "Jane Doe", "", "x.md");
        assert_eq!(topics(&signals, SignalKind::Ask), vec!["the roadmap"]);
    }

    #[test]
    fn test_timestamped_speaker_labels() {
        let body = "**[00:01:02] Jane Doe**: can we revisit pricing\n\
                    [00:02:10] **Jane Doe**: what about a pilot\n\
                    **[00:03:00] Bob Smith**: how about a discount";
        let signals = extract_signals(body, "Jane Doe", "", "call.md");
        assert_eq!(
            topics(&signals, SignalKind::Ask),
            vec!["revisit pricing", "a pilot"]
        );
        assert!(speaks_in(body, "Jane Doe"));
    }

    #[test]
    fn test_speaks_in() {
        assert!(speaks_in("Intro\nJane: hello there", "Jane Doe"));
        assert!(!speaks_in("Janet: hello there", "Jane Doe"));
        assert!(!speaks_in("No speakers here.", "Jane Doe"));
    }

    #[test]
    fn test_normalize_topic() {
        assert_eq!(
            normalize_topic("  ...The   Pricing & Packaging (v2) ").as_deref(),
            Some("the pricing packaging v2")
        );
        assert_eq!(normalize_topic("it").as_deref(), None);
        assert_eq!(normalize_topic("!!").as_deref(), None);
        let long = "word ".repeat(40);
        assert!(normalize_topic(&long).unwrap().chars().count() <= MAX_TOPIC_CHARS);
    }
}
