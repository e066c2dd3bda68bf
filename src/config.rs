use crate::error::{EtlError, Result};
use crate::types::FetchFilters;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "funding_etl.toml";
pub const CONFIG_PATH_ENV: &str = "FUNDING_ETL_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub inter_source_delay_ms: u64,
    pub limit: usize,
    pub nsf_date_start: NaiveDate,
    pub nih_fiscal_years: Vec<i32>,
    pub user_agent: String,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("funding"),
            log_dir: PathBuf::from("logs"),
            request_timeout_secs: 30,
            inter_source_delay_ms: 2000,
            limit: 1000,
            nsf_date_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
            nih_fiscal_years: (2020..=2025).collect(),
            user_agent: concat!("funding_etl/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl EtlConfig {
    /// Load from an explicit path, `$FUNDING_ETL_CONFIG`, or `funding_etl.toml`.
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(p) if !p.trim().is_empty() => (PathBuf::from(p), true),
                _ => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
            },
        };

        if !path.exists() {
            if required {
                return Err(EtlError::Config(format!(
                    "Config file '{}' does not exist",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EtlConfig = toml::from_str(content)?;
        if config.limit == 0 {
            return Err(EtlError::Config("limit must be > 0".to_string()));
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn inter_source_delay(&self) -> Duration {
        Duration::from_millis(self.inter_source_delay_ms)
    }

    /// Build request filters for a run happening on `run_date`
    pub fn fetch_filters(&self, run_date: NaiveDate) -> FetchFilters {
        FetchFilters {
            limit: self.limit,
            date_start: self.nsf_date_start,
            date_end: run_date,
            fiscal_years: self.nih_fiscal_years.clone(),
        }
    }
}
