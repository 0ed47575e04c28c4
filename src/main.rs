//! CLI entry point for the charity insights dashboard tool.
//!
//! Provides subcommands for visualising an uploaded CSV, contributing it to
//! the shared backend, visualising every contribution, exporting enriched
//! rows and downloading the template CSV.

mod infra;

use crate::infra::postcodes_io::client::PostcodesIoClient;
use crate::infra::supabase::client::SupabaseClient;
use anyhow::{Context, Result};
use charity_insights::analyzers::analyzer::{Analysis, analyze_records, analyze_rows};
use charity_insights::analyzers::types::DashboardOptions;
use charity_insights::chart::{ChartSet, DashboardMode};
use charity_insights::config::Settings;
use charity_insights::contribute::{
    ContributionRow, EnrichedBatch, contribute, enrich, organisation_name,
};
use charity_insights::fetch::BasicClient;
use charity_insights::output::{print_json, write_json, write_rows, write_sample};
use charity_insights::parser::parse_upload;
use charity_insights::records::{Field, Schema, normalize_batch};
use charity_insights::services::{ContributionStore, PostcodeLookup};
use charity_insights::stats::BatchStats;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "charity_insights")]
#[command(about = "Visualise and contribute charity-sector activity data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate an uploaded CSV and emit chart-ready JSON for it
    Visualise {
        /// CSV file in the template format
        #[arg(value_name = "FILE")]
        source: String,

        /// Skip the postcode lookups; location charts then use the free-text
        /// location instead of the local authority
        #[arg(long, default_value_t = false)]
        no_enrich: bool,

        /// Field used for the location charts
        #[arg(long, value_enum, default_value_t = Field::LocalAuthority)]
        location_field: Field,

        /// Write the chart JSON here instead of logging it
        #[arg(short, long)]
        output: Option<String>,

        /// Maximum number of concurrent postcode lookups
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
    /// Enrich an uploaded CSV and add it to the shared backend
    Contribute {
        /// CSV file in the template format
        #[arg(value_name = "FILE")]
        source: String,

        /// Name of the contributing organisation
        #[arg(long)]
        organisation: String,

        /// Maximum number of concurrent postcode lookups
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Write the local chart JSON here instead of logging it
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Aggregate every contribution in the shared backend
    AllData {
        /// Write the chart JSON here instead of logging it
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Write enriched rows in the backend column layout
    Export {
        /// CSV file in the template format
        #[arg(value_name = "FILE")]
        source: String,

        /// Destination CSV path
        #[arg(short, long, default_value = "enriched.csv")]
        output: String,

        /// Gzip compress the exported CSV
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Maximum number of concurrent postcode lookups
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
    /// Write the template CSV contributors should upload
    Sample {
        #[arg(short, long, default_value = "SampleData.csv")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/charity_insights.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("charity_insights.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Visualise {
            source,
            no_enrich,
            location_field,
            output,
            concurrency,
        } => {
            let options = DashboardOptions::for_upload(location_field, !no_enrich);
            let rows = parse_upload(&read_source(&source)?)?;

            let analysis = if no_enrich {
                analyze_rows(&rows, Schema::Upload, &options)
            } else {
                let batch = normalize_batch(&rows, Schema::Upload);
                let lookup = postcode_lookup(&settings)?;
                let enriched = enrich(
                    batch.records,
                    lookup,
                    concurrency.unwrap_or(settings.lookup_concurrency),
                )
                .await;
                report_lookup_warnings(&enriched);
                analyze_records(enriched.records, batch.stats, &options)
            };

            report_batch(&analysis.stats);
            emit(&analysis, DashboardMode::Mine, output.as_deref())?;
        }
        Commands::Contribute {
            source,
            organisation,
            concurrency,
            output,
        } => {
            let organisation = organisation_name(&organisation)?;
            let store = backend_store(&settings)?;

            let rows = parse_upload(&read_source(&source)?)?;
            let batch = normalize_batch(&rows, Schema::Upload);
            report_batch(&batch.stats);

            let lookup = postcode_lookup(&settings)?;
            let enriched = enrich(
                batch.records,
                lookup,
                concurrency.unwrap_or(settings.lookup_concurrency),
            )
            .await;
            report_lookup_warnings(&enriched);

            let analysis =
                analyze_records(enriched.records, batch.stats, &DashboardOptions::default());
            emit(&analysis, DashboardMode::Mine, output.as_deref())?;

            match contribute(store.as_ref(), organisation, &analysis.records).await {
                Ok(receipt) => {
                    info!(
                        organisation_id = ?receipt.organisation_id,
                        inserted = receipt.inserted,
                        "Thank you for contributing your data!"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Contribution did not complete");
                    return Err(e);
                }
            }
        }
        Commands::AllData { output } => {
            let store = backend_store(&settings)?;
            let rows = store
                .fetch_rows()
                .await
                .inspect_err(|e| error!(error = %e, "Error fetching data"))?;
            info!(rows = rows.len(), "Fetched contributed rows");

            let analysis = analyze_rows(&rows, Schema::Stored, &DashboardOptions::default());
            report_batch(&analysis.stats);
            emit(&analysis, DashboardMode::All, output.as_deref())?;
        }
        Commands::Export {
            source,
            output,
            gzip,
            concurrency,
        } => {
            let rows = parse_upload(&read_source(&source)?)?;
            let batch = normalize_batch(&rows, Schema::Upload);
            report_batch(&batch.stats);

            let lookup = postcode_lookup(&settings)?;
            let enriched = enrich(
                batch.records,
                lookup,
                concurrency.unwrap_or(settings.lookup_concurrency),
            )
            .await;
            report_lookup_warnings(&enriched);

            let rows: Vec<ContributionRow> =
                enriched.records.iter().map(ContributionRow::from).collect();
            write_rows(&output, &rows, gzip)?;
        }
        Commands::Sample { output } => {
            write_sample(&output)?;
        }
    }

    Ok(())
}

/// Reads an uploaded CSV from disk.
#[tracing::instrument]
fn read_source(path: &str) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {path}"))
}

fn postcode_lookup(settings: &Settings) -> Result<Arc<dyn PostcodeLookup>> {
    let http = BasicClient::new(settings.lookup_timeout)?;
    Ok(Arc::new(PostcodesIoClient::new(
        http,
        &settings.postcode_api_url,
    )?))
}

fn backend_store(settings: &Settings) -> Result<Box<dyn ContributionStore>> {
    let backend = settings.backend()?;
    let http = BasicClient::new(settings.lookup_timeout)?;
    Ok(Box::new(SupabaseClient::new(http, backend.url, backend.key)?))
}

fn report_batch(stats: &BatchStats) {
    info!(
        total = stats.total_rows,
        kept = stats.kept_rows,
        dropped = stats.dropped_dates,
        coerced_counts = stats.coerced_counts,
        month_first = stats.month_first_dates,
        "Batch normalized"
    );
    if !stats.has_issues() {
        return;
    }
    for dropped in &stats.dropped {
        warn!(row = dropped.row, date = %dropped.date, "Invalid date format");
    }
    if stats.month_first_dates > 0 {
        warn!(
            count = stats.month_first_dates,
            "Some dates only parse as month-first; review them for data quality"
        );
    }
}

fn report_lookup_warnings(batch: &EnrichedBatch) {
    for w in &batch.warnings {
        warn!(row = w.row, postcode = %w.postcode, "{}", w.message);
    }
}

fn emit(analysis: &Analysis, mode: DashboardMode, output: Option<&str>) -> Result<()> {
    let charts = ChartSet::build(&analysis.dashboard, mode);
    if charts.is_empty() {
        info!("No data to visualise");
        return Ok(());
    }

    match output {
        Some(path) => {
            write_json(path, &charts)?;
            info!(path, charts = charts.charts.len(), "Charts written");
        }
        None => print_json(&charts)?,
    }
    Ok(())
}
