pub mod diu;
pub mod envelope;
pub mod nih;
pub mod nsf;
pub mod sbir;

use crate::constants::{self, ALL_SOURCES, DIU_SOURCE, NIH_SOURCE, NSF_SOURCE, SBIR_SOURCE};
use crate::http_client::HttpClient;
use crate::types::FundingSource;

/// Build the adapter registered under `source_name`, if any. Names are case-insensitive.
pub fn create_source(source_name: &str, http: &HttpClient) -> Option<Box<dyn FundingSource>> {
    match source_name.to_lowercase().as_str() {
        SBIR_SOURCE => Some(Box::new(sbir::SbirSource::new(http.clone()))),
        NSF_SOURCE => Some(Box::new(nsf::NsfSource::new(http.clone()))),
        NIH_SOURCE => Some(Box::new(nih::NihSource::new(http.clone()))),
        DIU_SOURCE => Some(Box::new(diu::DiuSource::new())),
        _ => None,
    }
}

/// Expand `all` into every supported source; other names pass through trimmed and lower-cased.
pub fn expand_source_names<S: AsRef<str>>(requested: &[S]) -> Vec<String> {
    let names: Vec<String> = requested
        .iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if names.iter().any(|n| n == ALL_SOURCES) {
        return constants::get_supported_sources()
            .into_iter()
            .map(str::to_string)
            .collect();
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn http() -> HttpClient {
        HttpClient::new(Duration::from_secs(1), "funding_etl-test").unwrap()
    }

    #[test]
    fn registry_knows_every_supported_source() {
        let http = http();
        for name in constants::get_supported_sources() {
            let source = create_source(name, &http).expect("registered");
            assert_eq!(source.source_name(), name);
        }
    }

    #[test]
    fn registry_is_case_insensitive() {
        let source = create_source("NIH", &http()).unwrap();
        assert_eq!(source.source_name(), "nih");
    }

    #[test]
    fn unknown_source_is_none() {
        assert!(create_source("usaspending", &http()).is_none());
    }

    #[test]
    fn only_sbir_filters_and_diu_is_unimplemented() {
        let http = http();
        assert!(create_source("sbir", &http).unwrap().applies_relevance_filter());
        assert!(!create_source("nsf", &http).unwrap().applies_relevance_filter());
        assert!(!create_source("diu", &http).unwrap().is_implemented());
        assert!(create_source("nih", &http).unwrap().is_implemented());
    }

    #[test]
    fn all_expands_to_every_source() {
        assert_eq!(
            expand_source_names(&["nsf", "all"]),
            vec!["sbir", "nsf", "nih", "diu"]
        );
    }

    #[test]
    fn explicit_names_keep_order() {
        assert_eq!(
            expand_source_names(&[" NIH ", "sbir", "", "bogus"]),
            vec!["nih", "sbir", "bogus"]
        );
    }
}
