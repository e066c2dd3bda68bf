use crate::error::{EtlError, Result};
use crate::filter::filter_relevant;
use crate::merge::{combine_outputs, CombinedOutput};
use crate::normalize::normalize_all;
use crate::sink::{OutputFormat, Sink};
use crate::types::{Dataset, FetchFilters, FundingSource};
use metrics::counter;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

/// Per-run parameters shared by every source
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub keyword: String,
    pub format: OutputFormat,
    pub filters: FetchFilters,
    pub inter_source_delay: Duration,
}

/// What happened to one requested source
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Written {
        path: PathBuf,
        fetched: usize,
        records: usize,
    },
    Empty {
        fetched: usize,
    },
    Unimplemented,
    Failed {
        reason: String,
    },
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub outcome: SourceOutcome,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub keyword: String,
    pub format: OutputFormat,
    pub sources: Vec<SourceReport>,
    pub combined: Option<CombinedOutput>,
}

impl PipelineReport {
    /// Per-source files written this run, in run order
    pub fn output_files(&self) -> Vec<(String, PathBuf)> {
        self.sources
            .iter()
            .filter_map(|r| match &r.outcome {
                SourceOutcome::Written { path, .. } => Some((r.source.clone(), path.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn succeeded(&self) -> Vec<&str> {
        self.with_outcome(|o| matches!(o, SourceOutcome::Written { .. }))
    }

    pub fn failed(&self) -> Vec<&str> {
        self.with_outcome(|o| matches!(o, SourceOutcome::Failed { .. }))
    }

    pub fn unknown(&self) -> Vec<&str> {
        self.with_outcome(|o| matches!(o, SourceOutcome::Unknown))
    }

    fn with_outcome(&self, pred: impl Fn(&SourceOutcome) -> bool) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|r| pred(&r.outcome))
            .map(|r| r.source.as_str())
            .collect()
    }
}

pub struct Pipeline<'a> {
    sink: &'a dyn Sink,
    settings: PipelineSettings,
}

impl<'a> Pipeline<'a> {
    pub fn new(sink: &'a dyn Sink, settings: PipelineSettings) -> Self {
        Self { sink, settings }
    }

    /// Fetch, filter and normalize one source. Returns the raw count and the dataset.
    #[instrument(skip_all, fields(source = %source.source_name()))]
    pub async fn extract(
        source: &dyn FundingSource,
        keyword: &str,
        filters: &FetchFilters,
    ) -> Result<(usize, Dataset)> {
        let name = source.source_name();
        let raw = source.fetch(keyword, filters).await?;
        let fetched = raw.len();
        counter!("funding_records_fetched_total", "source" => name).increment(fetched as u64);

        let raw = if source.applies_relevance_filter() {
            let relevant = filter_relevant(raw, keyword);
            info!("{} of {} records passed the relevance filter", relevant.len(), fetched);
            relevant
        } else {
            raw
        };

        let dataset = normalize_all(&raw, name);
        debug!("Normalized {} records", dataset.len());
        Ok((fetched, dataset))
    }

    async fn run_source(&self, source: &dyn FundingSource) -> SourceOutcome {
        let name = source.source_name();
        counter!("funding_source_runs_total", "source" => name).increment(1);

        let (fetched, dataset) =
            match Self::extract(source, &self.settings.keyword, &self.settings.filters).await {
                Ok(extracted) => extracted,
                Err(e) => {
                    warn!("Extraction failed for {}: {}", name, e);
                    counter!("funding_source_failures_total", "source" => name).increment(1);
                    return SourceOutcome::Failed {
                        reason: e.to_string(),
                    };
                }
            };

        if !source.is_implemented() {
            warn!("Source {} is not implemented yet", name);
            return SourceOutcome::Unimplemented;
        }

        if dataset.is_empty() {
            info!("No data extracted from {}", name);
            return SourceOutcome::Empty { fetched };
        }

        counter!("funding_records_normalized_total", "source" => name)
            .increment(dataset.len() as u64);
        match self.sink.write_dataset(name, &dataset) {
            Ok(path) => SourceOutcome::Written {
                path,
                fetched,
                records: dataset.len(),
            },
            Err(e) => {
                error!("Failed to persist {} records: {}", name, e);
                counter!("funding_source_failures_total", "source" => name).increment(1);
                SourceOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Run every requested source in order, then build the combined dataset.
    ///
    /// `resolve` maps a source name to its adapter. Unknown names, failed
    /// fetches and failed writes are recorded in the report; the run itself
    /// never aborts.
    pub async fn run<F>(&self, requested: &[String], resolve: F) -> PipelineReport
    where
        F: Fn(&str) -> Option<Box<dyn FundingSource>>,
    {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id);

        async move {
            info!(
                "Starting funding pipeline: sources={:?} keyword='{}' format={}",
                requested, self.settings.keyword, self.settings.format
            );

            let mut reports = Vec::with_capacity(requested.len());
            for name in requested {
                let Some(source) = resolve(name.as_str()) else {
                    let e = EtlError::UnknownSource(name.clone());
                    warn!("{}, skipping", e);
                    reports.push(SourceReport {
                        source: name.clone(),
                        outcome: SourceOutcome::Unknown,
                    });
                    continue;
                };

                let outcome = self
                    .run_source(source.as_ref())
                    .instrument(info_span!("source", source = %name))
                    .await;
                reports.push(SourceReport {
                    source: source.source_name().to_string(),
                    outcome,
                });

                // cooperative throttle between third-party APIs
                if source.is_implemented() && !self.settings.inter_source_delay.is_zero() {
                    tokio::time::sleep(self.settings.inter_source_delay).await;
                }
            }

            let mut report = PipelineReport {
                run_id,
                keyword: self.settings.keyword.clone(),
                format: self.settings.format,
                sources: reports,
                combined: None,
            };
            report.combined = self.write_combined(&report.output_files());
            info!("Funding pipeline complete");
            report
        }
        .instrument(span)
        .await
    }

    fn write_combined(&self, outputs: &[(String, PathBuf)]) -> Option<CombinedOutput> {
        if outputs.is_empty() {
            warn!("No per-source outputs; skipping combined dataset");
            return None;
        }

        let combined = combine_outputs(self.sink, outputs);
        if combined.records.is_empty() {
            warn!("No readable per-source outputs; skipping combined dataset");
            return None;
        }

        match self.sink.write_combined(&combined.records) {
            Ok(path) => {
                info!(
                    "Combined dataset saved: {} ({} records)",
                    path.display(),
                    combined.total_records()
                );
                Some(CombinedOutput {
                    path,
                    total_records: combined.total_records(),
                    source_counts: combined.source_counts,
                    skipped: combined.skipped,
                })
            }
            Err(e) => {
                error!("Failed to write combined dataset: {}", e);
                None
            }
        }
    }
}
