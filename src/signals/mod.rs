//! Person-memory mining: recurring asks and concerns per person.
//!
//! Meetings and conversations are scanned for signals attributed to each
//! person, repeated topics are aggregated, and the result is written into a
//! marked block of the person's file.

pub mod aggregate;
pub mod extract;
pub mod refresh;
pub mod section;

pub use aggregate::{aggregate, AggregatedPersonSignal, AggregatedSignals, DEFAULT_MIN_MENTIONS};
pub use extract::{extract_signals, normalize_topic, PersonMemorySignal, SignalKind};
pub use refresh::{is_stale, refresh_person_memory, RefreshOptions, RefreshResult, SEARCH_LIMIT};
pub use section::{
    extract_memory_section, last_refreshed, render_section, upsert_section, MEMORY_END,
    MEMORY_HEADER, MEMORY_START,
};
