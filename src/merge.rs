use crate::sink::Sink;
use crate::types::Dataset;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of concatenating per-source datasets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Combined {
    pub records: Dataset,
    /// Row count per included source, in combine order
    pub source_counts: Vec<(String, usize)>,
    /// Sources whose persisted output could not be read back
    pub skipped: Vec<(String, String)>,
}

impl Combined {
    pub fn total_records(&self) -> usize {
        self.records.len()
    }
}

/// Summary of the combined file written for a run
#[derive(Debug, Clone, Serialize)]
pub struct CombinedOutput {
    pub path: PathBuf,
    pub total_records: usize,
    pub source_counts: Vec<(String, usize)>,
    pub skipped: Vec<(String, String)>,
}

/// Concatenate datasets in the given order. No dedup, no re-sort.
pub fn combine<I>(per_source: I) -> Combined
where
    I: IntoIterator<Item = (String, Dataset)>,
{
    let mut combined = Combined::default();
    for (source, dataset) in per_source {
        combined.source_counts.push((source, dataset.len()));
        combined.records.extend(dataset);
    }
    combined
}

/// Reload each per-source output through `sink` and concatenate.
/// Unreadable outputs are skipped with a warning.
pub fn combine_outputs(sink: &dyn Sink, outputs: &[(String, PathBuf)]) -> Combined {
    let mut loaded = Vec::with_capacity(outputs.len());
    let mut skipped = Vec::new();

    for (source, path) in outputs {
        match sink.read_dataset(path) {
            Ok(dataset) => loaded.push((source.clone(), dataset)),
            Err(e) => {
                warn!(source = %source, "Skipping unreadable output {}: {}", path.display(), e);
                skipped.push((source.clone(), e.to_string()));
            }
        }
    }

    let mut combined = combine(loaded);
    combined.skipped = skipped;
    info!(
        "Combined {} records from {} sources ({} skipped)",
        combined.total_records(),
        combined.source_counts.len(),
        combined.skipped.len()
    );
    combined
}
