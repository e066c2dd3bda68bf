use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use funding_etl::apis::{create_source, expand_source_names};
use funding_etl::config::EtlConfig;
use funding_etl::constants::DEFAULT_KEYWORD;
use funding_etl::http_client::HttpClient;
use funding_etl::logging;
use funding_etl::pipeline::{Pipeline, PipelineReport, PipelineSettings, SourceOutcome};
use funding_etl::sink::{FileSink, OutputFormat};

#[derive(Parser)]
#[command(name = "funding_etl")]
#[command(about = "ETL pipeline for U.S. AI funding data")]
#[command(version)]
struct Cli {
    /// Data sources to extract (sbir, nsf, nih, diu, or all)
    #[arg(long, num_args = 1.., default_value = "sbir")]
    sources: Vec<String>,

    /// Search keyword
    #[arg(long, default_value = DEFAULT_KEYWORD)]
    keyword: String,

    /// Output format: json, csv or parquet
    #[arg(long, default_value = "json")]
    format: String,

    /// Output directory (overrides the config file)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the run report as JSON instead of a summary
    #[arg(long)]
    report_json: bool,
}

fn print_report(report: &PipelineReport) {
    println!("\nFunding pipeline run {}", report.run_id);
    println!("   Keyword: {}", report.keyword);
    println!("   Format: {}", report.format);
    for source in &report.sources {
        match &source.outcome {
            SourceOutcome::Written {
                path,
                fetched,
                records,
            } => println!(
                "   {}: {} records ({} fetched) -> {}",
                source.source,
                records,
                fetched,
                path.display()
            ),
            SourceOutcome::Empty { fetched } => {
                println!("   {}: no data ({} fetched)", source.source, fetched)
            }
            SourceOutcome::Unimplemented => println!("   {}: not implemented", source.source),
            SourceOutcome::Failed { reason } => {
                println!("   {}: failed ({})", source.source, reason)
            }
            SourceOutcome::Unknown => println!("   {}: unknown source, skipped", source.source),
        }
    }
    match &report.combined {
        Some(combined) => println!(
            "   Combined: {} records -> {}",
            combined.total_records,
            combined.path.display()
        ),
        None => println!("   Combined: nothing to combine"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = EtlConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    let _log_guard = logging::init_logging(&config.log_dir);

    // No valid sink exists for an unknown format, so fail before fetching anything
    let format: OutputFormat = cli.format.parse()?;

    let run_date = chrono::Local::now().date_naive();
    let sink = FileSink::new(&config.output_dir, format, run_date);
    sink.init()
        .with_context(|| format!("creating output directory {}", config.output_dir.display()))?;

    let http = HttpClient::new(config.request_timeout(), &config.user_agent)?;
    let sources = expand_source_names(cli.sources.as_slice());
    info!("Sources: {}", sources.join(", "));

    let settings = PipelineSettings {
        keyword: cli.keyword,
        format,
        filters: config.fetch_filters(run_date),
        inter_source_delay: config.inter_source_delay(),
    };
    let report = Pipeline::new(&sink, settings)
        .run(&sources, |name| create_source(name, &http))
        .await;

    if cli.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
