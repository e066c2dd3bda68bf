//! Flat-file persistence for datasets.
//!
//! File names embed the dataset label and run date:
//! `<label>_funding_<YYYYMMDD>.<ext>`. Reading picks the codec from the file
//! extension, so the combine step can reload whatever a run produced.

use crate::constants::{COMBINED_PREFIX, FUNDING_FILE_STEM};
use crate::error::{EtlError, Result};
use crate::types::{Dataset, FundingRecord, RawRecord};
use arrow_array::{Array, ArrayRef, Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::errors::ParquetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        ext.parse()
    }
}

impl FromStr for OutputFormat {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(EtlError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Destination for per-source and combined datasets
pub trait Sink {
    /// Persist `records` under `label` (a source name or the combined prefix)
    fn write_dataset(&self, label: &str, records: &[FundingRecord]) -> Result<PathBuf>;

    /// Load a dataset previously written by this sink
    fn read_dataset(&self, path: &Path) -> Result<Dataset>;

    fn write_combined(&self, records: &[FundingRecord]) -> Result<PathBuf> {
        self.write_dataset(COMBINED_PREFIX, records)
    }
}

/// Sink writing one file per dataset into a fixed output directory
#[derive(Debug, Clone)]
pub struct FileSink {
    output_dir: PathBuf,
    format: OutputFormat,
    run_date: NaiveDate,
}

impl FileSink {
    pub fn new(output_dir: impl Into<PathBuf>, format: OutputFormat, run_date: NaiveDate) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            run_date,
        }
    }

    /// Create the output directory. Must run before the first write.
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        debug!("Output directory ready: {}", self.output_dir.display());
        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn path_for(&self, label: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}_{}.{}",
            label,
            FUNDING_FILE_STEM,
            self.run_date.format("%Y%m%d"),
            self.format.extension()
        ))
    }
}

impl Sink for FileSink {
    fn write_dataset(&self, label: &str, records: &[FundingRecord]) -> Result<PathBuf> {
        let path = self.path_for(label);
        match self.format {
            OutputFormat::Json => write_json(&path, records)?,
            OutputFormat::Csv => write_csv(&path, records)?,
            OutputFormat::Parquet => write_parquet(&path, records)?,
        }
        info!("Saved {} records to {}", records.len(), path.display());
        Ok(path)
    }

    fn read_dataset(&self, path: &Path) -> Result<Dataset> {
        match OutputFormat::from_path(path)? {
            OutputFormat::Json => read_json(path),
            OutputFormat::Csv => read_csv(path),
            OutputFormat::Parquet => read_parquet(path),
        }
    }
}

// ---- JSON ----

fn write_json(path: &Path, records: &[FundingRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

fn read_json(path: &Path) -> Result<Dataset> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

// ---- CSV ----

/// Flat CSV row; `raw` travels as a JSON string cell
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    source: String,
    id: Option<String>,
    title: Option<String>,
    organization: Option<String>,
    amount: Option<f64>,
    start_date: Option<String>,
    end_date: Option<String>,
    agency: Option<String>,
    description: Option<String>,
    url: Option<String>,
    raw: String,
}

impl CsvRow {
    fn from_record(record: &FundingRecord) -> Result<Self> {
        Ok(Self {
            source: record.source.clone(),
            id: record.id.clone(),
            title: record.title.clone(),
            organization: record.organization.clone(),
            amount: record.amount,
            start_date: record.start_date.clone(),
            end_date: record.end_date.clone(),
            agency: record.agency.clone(),
            description: record.description.clone(),
            url: record.url.clone(),
            raw: serde_json::to_string(&record.raw)?,
        })
    }

    fn into_record(self) -> Result<FundingRecord> {
        let raw: RawRecord = serde_json::from_str(&self.raw)?;
        Ok(FundingRecord {
            source: self.source,
            id: self.id,
            title: self.title,
            organization: self.organization,
            amount: self.amount,
            start_date: self.start_date,
            end_date: self.end_date,
            agency: self.agency,
            description: self.description,
            url: self.url,
            raw,
        })
    }
}

fn write_csv(path: &Path, records: &[FundingRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(CsvRow::from_record(record)?)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut dataset = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        dataset.push(row?.into_record()?);
    }
    Ok(dataset)
}

// ---- Parquet ----

const STRING_COLUMNS: &[&str] = &[
    "id",
    "title",
    "organization",
    "start_date",
    "end_date",
    "agency",
    "description",
    "url",
];

fn parquet_schema() -> Schema {
    let mut fields = vec![Field::new("source", DataType::Utf8, false)];
    fields.extend(
        STRING_COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, true)),
    );
    fields.push(Field::new("amount", DataType::Float64, true));
    fields.push(Field::new("raw", DataType::Utf8, false));
    Schema::new(fields)
}

fn string_field(record: &FundingRecord, name: &str) -> Option<String> {
    match name {
        "id" => record.id.clone(),
        "title" => record.title.clone(),
        "organization" => record.organization.clone(),
        "start_date" => record.start_date.clone(),
        "end_date" => record.end_date.clone(),
        "agency" => record.agency.clone(),
        "description" => record.description.clone(),
        "url" => record.url.clone(),
        _ => None,
    }
}

fn write_parquet(path: &Path, records: &[FundingRecord]) -> Result<()> {
    let schema = Arc::new(parquet_schema());

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(STRING_COLUMNS.len() + 3);
    columns.push(Arc::new(StringArray::from(
        records.iter().map(|r| Some(r.source.clone())).collect::<Vec<_>>(),
    )));
    for name in STRING_COLUMNS {
        columns.push(Arc::new(StringArray::from(
            records
                .iter()
                .map(|r| string_field(r, name))
                .collect::<Vec<_>>(),
        )));
    }
    columns.push(Arc::new(Float64Array::from(
        records.iter().map(|r| r.amount).collect::<Vec<_>>(),
    )));
    let raw_json = records
        .iter()
        .map(|r| serde_json::to_string(&r.raw).map(Some))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    columns.push(Arc::new(StringArray::from(raw_json)));

    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| missing_column(name))
}

fn missing_column(name: &str) -> EtlError {
    EtlError::Parquet(ParquetError::General(format!(
        "missing or mistyped column '{name}'"
    )))
}

fn cell(col: &StringArray, row: usize) -> Option<String> {
    if col.is_null(row) {
        None
    } else {
        Some(col.value(row).to_string())
    }
}

fn read_parquet(path: &Path) -> Result<Dataset> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
    let mut dataset = Vec::new();

    for batch in reader {
        let batch = batch?;
        let source = string_column(&batch, "source")?;
        let text = STRING_COLUMNS
            .iter()
            .map(|name| string_column(&batch, name))
            .collect::<Result<Vec<_>>>()?;
        let amount = batch
            .column_by_name("amount")
            .and_then(|col| col.as_any().downcast_ref::<Float64Array>())
            .ok_or_else(|| missing_column("amount"))?;
        let raw = string_column(&batch, "raw")?;

        for row in 0..batch.num_rows() {
            let raw_record: RawRecord = match cell(raw, row) {
                Some(json) => serde_json::from_str(&json)?,
                None => RawRecord::new(),
            };
            dataset.push(FundingRecord {
                source: cell(source, row).unwrap_or_default(),
                id: cell(text[0], row),
                title: cell(text[1], row),
                organization: cell(text[2], row),
                start_date: cell(text[3], row),
                end_date: cell(text[4], row),
                agency: cell(text[5], row),
                description: cell(text[6], row),
                url: cell(text[7], row),
                amount: if amount.is_null(row) {
                    None
                } else {
                    Some(amount.value(row))
                },
                raw: raw_record,
            });
        }
    }
    Ok(dataset)
}
