//! Roll per-document signals up into repeated topics.

use serde::{Deserialize, Serialize};

use super::extract::{PersonMemorySignal, SignalKind};

pub const DEFAULT_MIN_MENTIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPersonSignal {
    pub topic: String,
    pub count: usize,
    /// Latest `YYYY-MM-DD` seen, or empty if no source was dated.
    pub last_mentioned: String,
    /// Source file names, unique, in first-seen order.
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSignals {
    pub asks: Vec<AggregatedPersonSignal>,
    pub concerns: Vec<AggregatedPersonSignal>,
}

fn aggregate_kind(
    signals: &[PersonMemorySignal],
    kind: SignalKind,
    min_mentions: usize,
) -> Vec<AggregatedPersonSignal> {
    let mut topics: Vec<AggregatedPersonSignal> = Vec::new();
    for signal in signals.iter().filter(|s| s.kind == kind) {
        let entry = match topics.iter().position(|t| t.topic == signal.topic) {
            Some(i) => &mut topics[i],
            None => {
                topics.push(AggregatedPersonSignal {
                    topic: signal.topic.clone(),
                    count: 0,
                    last_mentioned: String::new(),
                    sources: Vec::new(),
                });
                let last = topics.len() - 1;
                &mut topics[last]
            }
        };
        entry.count += 1;
        if signal.date > entry.last_mentioned {
            entry.last_mentioned = signal.date.clone();
        }
        if !entry.sources.contains(&signal.source) {
            entry.sources.push(signal.source.clone());
        }
    }

    topics.retain(|t| t.count >= min_mentions);
    topics.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.last_mentioned.cmp(&a.last_mentioned))
    });
    topics
}

/// Group by topic within each kind, keeping topics seen at least `min_mentions` times.
pub fn aggregate(signals: &[PersonMemorySignal], min_mentions: usize) -> AggregatedSignals {
    AggregatedSignals {
        asks: aggregate_kind(signals, SignalKind::Ask, min_mentions),
        concerns: aggregate_kind(signals, SignalKind::Concern, min_mentions),
    }
}
