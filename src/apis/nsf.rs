use crate::apis::envelope::records_at;
use crate::constants::{NSF_API_URL, NSF_SOURCE};
use crate::error::Result;
use crate::http_client::HttpClient;
use crate::types::{FetchFilters, FundingSource, RawRecord};
use serde_json::Value;
use tracing::{info, instrument};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct NsfSource {
    http: HttpClient,
    base_url: String,
}

impl NsfSource {
    pub fn new(http: HttpClient) -> Self {
        Self::with_base_url(http, NSF_API_URL)
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
            ("dateStart", filters.date_start.format(DATE_FORMAT).to_string()),
            ("dateEnd", filters.date_end.format(DATE_FORMAT).to_string()),
            ("limit", filters.limit.to_string()),
        ]
    }

    pub fn unwrap_envelope(payload: &Value) -> Vec<RawRecord> {
        records_at(NSF_SOURCE, payload, &["response", "award"])
    }
}

#[async_trait::async_trait]
impl FundingSource for NsfSource {
    fn source_name(&self) -> &'static str {
        NSF_SOURCE
    }

    #[instrument(skip(self, filters))]
    async fn fetch(&self, keyword: &str, filters: &FetchFilters) -> Result<Vec<RawRecord>> {
        let payload = self
            .http
            .get_json(NSF_SOURCE, &self.base_url, &Self::query(keyword, filters))
            .await?;
        let grants = Self::unwrap_envelope(&payload);
        info!("Successfully fetched {} grants from NSF", grants.len());
        Ok(grants)
    }
}
