use crate::apis::envelope::records_at;
use crate::constants::{NIH_API_URL, NIH_SOURCE};
use crate::error::Result;
use crate::http_client::HttpClient;
use crate::types::{FetchFilters, FundingSource, RawRecord};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

/// NIH RePORTER project search body
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    criteria: Criteria<'a>,
    offset: usize,
    limit: usize,
}

#[derive(Debug, Serialize)]
struct Criteria<'a> {
    advanced_text_search: TextSearch<'a>,
    fiscal_years: &'a [i32],
}

#[derive(Debug, Serialize)]
struct TextSearch<'a> {
    search_text: &'a str,
}

pub struct NihSource {
    http: HttpClient,
    base_url: String,
}

impl NihSource {
    pub fn new(http: HttpClient) -> Self {
        Self::with_base_url(http, NIH_API_URL)
    }

    pub fn with_base_url(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn search_body<'a>(keyword: &'a str, filters: &'a FetchFilters) -> SearchRequest<'a> {
        SearchRequest {
            criteria: Criteria {
                advanced_text_search: TextSearch {
                    search_text: keyword,
                },
                fiscal_years: &filters.fiscal_years,
            },
            offset: 0,
            limit: filters.limit,
        }
    }

    pub fn unwrap_envelope(payload: &Value) -> Vec<RawRecord> {
        records_at(NIH_SOURCE, payload, &["results"])
    }
}

#[async_trait::async_trait]
impl FundingSource for NihSource {
    fn source_name(&self) -> &'static str {
        NIH_SOURCE
    }

    #[instrument(skip(self, filters))]
    async fn fetch(&self, keyword: &str, filters: &FetchFilters) -> Result<Vec<RawRecord>> {
        let body = Self::search_body(keyword, filters);
        let payload = self.http.post_json(NIH_SOURCE, &self.base_url, &body).await?;
        let projects = Self::unwrap_envelope(&payload);
        info!("Successfully fetched {} projects from NIH RePORTER", projects.len());
        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn search_body_matches_reporter_shape() {
        let filters = FetchFilters {
            limit: 500,
            date_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            date_end: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            fiscal_years: vec![2024, 2025],
        };
        let body = serde_json::to_value(NihSource::search_body("deep learning", &filters)).unwrap();
        assert_eq!(
            body,
            json!({
                "criteria": {
                    "advanced_text_search": {"search_text": "deep learning"},
                    "fiscal_years": [2024, 2025]
                },
                "offset": 0,
                "limit": 500
            })
        );
    }

    #[test]
    fn unwraps_results() {
        let payload = json!({
            "meta": {"total": 2},
            "results": [{"appl_id": 1}, {"appl_id": 2}]
        });
        assert_eq!(NihSource::unwrap_envelope(&payload).len(), 2);
    }
}
