use crate::apis::envelope::records_from_list;
use crate::constants::{SBIR_API_URL, SBIR_SOURCE};
use crate::error::Result;
use crate::http_client::HttpClient;
use crate::types::{FetchFilters, FundingSource, RawRecord};
use serde_json::Value;
use tracing::{info, instrument, warn};

pub struct SbirSource {
    http: HttpClient,
    base_url: String,
}

impl SbirSource {
    pub fn new(http: HttpClient) -> Self {
        Self::with_base_url(http, SBIR_API_URL)
    }

    pub fn with_base_url(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn query(keyword: &str, filters: &FetchFilters) -> Vec<(&'static str, String)> {
        vec![
            ("keyword", keyword.to_string()),
            ("limit", filters.limit.to_string()),
            ("format", "json".to_string()),
        ]
    }

    /// SBIR answers either `{"awards": [...]}` or a bare list.
    pub fn unwrap_envelope(payload: &Value) -> Vec<RawRecord> {
        match payload {
            Value::Object(map) => match map.get("awards") {
                Some(awards) => records_from_list(SBIR_SOURCE, awards),
                None => {
                    warn!("SBIR response object has no 'awards' list; treating as zero records");
                    Vec::new()
                }
            },
            other => records_from_list(SBIR_SOURCE, other),
        }
    }
}

#[async_trait::async_trait]
impl FundingSource for SbirSource {
    fn source_name(&self) -> &'static str {
        SBIR_SOURCE
    }

    #[instrument(skip(self, filters))]
    async fn fetch(&self, keyword: &str, filters: &FetchFilters) -> Result<Vec<RawRecord>> {
        let payload = self
            .http
            .get_json(SBIR_SOURCE, &self.base_url, &Self::query(keyword, filters))
            .await?;
        let awards = Self::unwrap_envelope(&payload);
        info!("Successfully fetched {} awards from SBIR", awards.len());
        Ok(awards)
    }

    fn applies_relevance_filter(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn query_carries_keyword_and_limit() {
        let filters = FetchFilters {
            limit: 250,
            date_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            date_end: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            fiscal_years: vec![],
        };
        let query = SbirSource::query("machine learning", &filters);
        assert!(query.contains(&("keyword", "machine learning".to_string())));
        assert!(query.contains(&("limit", "250".to_string())));
        assert!(query.contains(&("format", "json".to_string())));
    }

    #[test]
    fn unwraps_awards_object() {
        let payload = json!({"awards": [{"award_title": "x"}, {"award_title": "y"}]});
        assert_eq!(SbirSource::unwrap_envelope(&payload).len(), 2);
    }

    #[test]
    fn unwraps_bare_list() {
        let payload = json!([{"award_title": "x"}]);
        assert_eq!(SbirSource::unwrap_envelope(&payload).len(), 1);
    }

    #[test]
    fn unknown_shape_is_empty() {
        assert!(SbirSource::unwrap_envelope(&json!({"data": []})).is_empty());
        assert!(SbirSource::unwrap_envelope(&json!("maintenance")).is_empty());
    }
}
