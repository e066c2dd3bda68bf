use crate::constants::DIU_SOURCE;
use crate::error::Result;
use crate::types::{FetchFilters, FundingSource, RawRecord};
use tracing::{info, instrument};

/// Defense Innovation Unit contracts.
///
/// No public award API is integrated yet. Candidate feeds are the SAM.gov
/// opportunities API, FOIA releases, or scraping diu.mil; any of them would
/// plug in here by returning raw records.
#[derive(Default)]
pub struct DiuSource;

impl DiuSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl FundingSource for DiuSource {
    fn source_name(&self) -> &'static str {
        DIU_SOURCE
    }

    #[instrument(skip(self, _filters))]
    async fn fetch(&self, _keyword: &str, _filters: &FetchFilters) -> Result<Vec<RawRecord>> {
        info!("DIU extraction not yet implemented; returning no records");
        Ok(Vec::new())
    }

    fn is_implemented(&self) -> bool {
        false
    }
}
