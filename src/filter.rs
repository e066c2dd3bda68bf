use crate::constants::{AI_TERMS, RELEVANCE_TEXT_FIELDS};
use crate::types::RawRecord;
use tracing::debug;

/// Keep only records whose text fields mention an AI term.
///
/// `keyword` does not influence matching: the term set is always `AI_TERMS`.
/// Matching is substring containment on the lower-cased concatenation of
/// `title`, `abstract`, `description` and `summary`.
pub fn filter_relevant(records: Vec<RawRecord>, keyword: &str) -> Vec<RawRecord> {
    debug!(
        keyword = %keyword,
        "Relevance filter matches the fixed AI term list, not the requested keyword"
    );
    records.into_iter().filter(is_relevant).collect()
}

pub fn is_relevant(record: &RawRecord) -> bool {
    let text = searchable_text(record);
    AI_TERMS.iter().any(|term| text.contains(term))
}

fn searchable_text(record: &RawRecord) -> String {
    RELEVANCE_TEXT_FIELDS
        .iter()
        .map(|field| record.get(*field).and_then(|v| v.as_str()).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
