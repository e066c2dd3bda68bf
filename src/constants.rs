/// Source name constants to ensure consistency across the codebase

// Source names (used in CLI, file names and the `source` tag)
pub const SBIR_SOURCE: &str = "sbir";
pub const NSF_SOURCE: &str = "nsf";
pub const NIH_SOURCE: &str = "nih";
pub const DIU_SOURCE: &str = "diu";

/// Selector that expands to every supported source
pub const ALL_SOURCES: &str = "all";

// Endpoints
pub const SBIR_API_URL: &str = "https://www.sbir.gov/api/awards.json";
pub const NSF_API_URL: &str = "https://api.nsf.gov/services/v1/awards.json";
pub const NIH_API_URL: &str = "https://api.reporter.nih.gov/v2/projects/search";

pub const DEFAULT_KEYWORD: &str = "artificial intelligence";

/// Terms the relevance filter looks for, lower-case
pub const AI_TERMS: &[&str] = &[
    "artificial intelligence",
    "ai",
    "machine learning",
    "ml",
    "neural network",
    "deep learning",
    "natural language processing",
];

/// Text fields concatenated by the relevance filter
pub const RELEVANCE_TEXT_FIELDS: &[&str] = &["title", "abstract", "description", "summary"];

pub const FUNDING_FILE_STEM: &str = "funding";
pub const COMBINED_PREFIX: &str = "combined";

/// Get all supported source names, in default run order
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![SBIR_SOURCE, NSF_SOURCE, NIH_SOURCE, DIU_SOURCE]
}
