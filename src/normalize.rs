//! Projection of source-specific raw records onto `FundingRecord`.
//!
//! Each canonical attribute has an ordered list of raw keys. The first key
//! *present* in the record wins, even if its value is empty or null.

use crate::amount::parse_amount;
use crate::types::{Dataset, FundingRecord, RawRecord};
use serde_json::Value;

/// Canonical string attributes resolved from candidate keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    Id,
    Title,
    Organization,
    StartDate,
    EndDate,
    Agency,
    Description,
    Url,
}

/// Canonical field → ordered raw keys
pub const FIELD_CANDIDATES: &[(CanonicalField, &[&str])] = &[
    (CanonicalField::Id, &["id", "award_id", "contract_number"]),
    (CanonicalField::Title, &["title", "project_title", "name"]),
    (CanonicalField::Organization, &["organization", "recipient", "company"]),
    (CanonicalField::StartDate, &["start_date", "award_date", "date"]),
    (CanonicalField::EndDate, &["end_date", "completion_date"]),
    (CanonicalField::Agency, &["agency", "sponsor"]),
    (CanonicalField::Description, &["description", "abstract", "summary"]),
    (CanonicalField::Url, &["url", "link", "html_url"]),
];

impl CanonicalField {
    pub fn candidates(self) -> &'static [&'static str] {
        FIELD_CANDIDATES
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, keys)| *keys)
            .unwrap_or(&[])
    }
}

/// Return the value under the first candidate key present in `raw`.
pub fn first_present<'a>(raw: &'a RawRecord, candidates: &[&str]) -> Option<&'a Value> {
    candidates.iter().find_map(|key| raw.get(*key))
}

/// Strings pass through verbatim, null is absent, anything else becomes its JSON text.
fn project_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn resolve(raw: &RawRecord, field: CanonicalField) -> Option<String> {
    first_present(raw, field.candidates()).and_then(project_text)
}

/// Map one raw record onto the canonical schema.
pub fn normalize(raw: &RawRecord, source: &str) -> FundingRecord {
    FundingRecord {
        source: source.to_string(),
        id: resolve(raw, CanonicalField::Id),
        title: resolve(raw, CanonicalField::Title),
        organization: resolve(raw, CanonicalField::Organization),
        amount: parse_amount(raw),
        start_date: resolve(raw, CanonicalField::StartDate),
        end_date: resolve(raw, CanonicalField::EndDate),
        agency: resolve(raw, CanonicalField::Agency).or_else(|| Some(source.to_uppercase())),
        description: resolve(raw, CanonicalField::Description),
        url: resolve(raw, CanonicalField::Url),
        raw: raw.clone(),
    }
}

pub fn normalize_all(raw_records: &[RawRecord], source: &str) -> Dataset {
    raw_records.iter().map(|raw| normalize(raw, source)).collect()
}
