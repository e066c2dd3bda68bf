use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl EtlError {
    pub fn unavailable(source_name: &str, reason: impl Into<String>) -> Self {
        EtlError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
