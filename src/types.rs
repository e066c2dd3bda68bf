use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw award data as returned from an external API, one object per award
pub type RawRecord = Map<String, Value>;

/// Canonical, cross-source representation of one award, grant or contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRecord {
    pub source: String,
    pub id: Option<String>,
    pub title: Option<String>,
    pub organization: Option<String>,
    pub amount: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub agency: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub raw: RawRecord,
}

/// Ordered sequence of normalized records. No cross-record invariants.
pub type Dataset = Vec<FundingRecord>;

/// Request filters shared by all adapters; each adapter uses the ones its API understands
#[derive(Debug, Clone)]
pub struct FetchFilters {
    pub limit: usize,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub fiscal_years: Vec<i32>,
}

/// Core trait that all funding data sources must implement
#[async_trait::async_trait]
pub trait FundingSource: Send + Sync {
    /// Unique identifier for this source, used as the `source` tag
    fn source_name(&self) -> &'static str;

    /// Fetch raw award records matching `keyword`
    async fn fetch(&self, keyword: &str, filters: &FetchFilters) -> Result<Vec<RawRecord>>;

    /// Whether fetched records go through the relevance filter before normalization
    fn applies_relevance_filter(&self) -> bool {
        false
    }

    /// False for sources that are registered but have no integration yet
    fn is_implemented(&self) -> bool {
        true
    }
}
