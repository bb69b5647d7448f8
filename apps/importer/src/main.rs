mod config;
mod errors;
mod extraction;
mod llm_client;
mod loader;
mod models;
mod sink;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::pipeline::{BatchReport, DocumentOutcome, Pipeline, SinkStatus};
use crate::llm_client::LlmClient;
use crate::loader::DocumentFormat;
use crate::sink::{AirtableSink, DryRunSink, RecordSink, SinkReceipt};

/// Import resumes into a structured store via LLM extraction.
#[derive(Parser, Debug)]
#[command(name = "importer", version)]
struct Cli {
    /// Resume file or directory of resumes
    path: PathBuf,

    /// Airtable table name (overrides AIRTABLE_TABLE_NAME)
    #[arg(long)]
    table: Option<String>,

    /// Don't store records; log would-be payloads instead
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(table) = cli.table {
        config.airtable_table = table;
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume importer v{}", env!("CARGO_PKG_VERSION"));

    let files = discover_files(&cli.path)?;
    if files.is_empty() {
        info!("no resume files found under {}", cli.path.display());
        return Ok(());
    }
    info!("found {} resume file(s)", files.len());

    let model = Arc::new(LlmClient::new(&config));
    info!("LLM client initialized (model: {})", config.model);

    let sink: Arc<dyn RecordSink> = if cli.dry_run {
        Arc::new(DryRunSink)
    } else if config.airtable_configured() {
        let token = config.airtable_token.clone().unwrap_or_default();
        let base_id = config.airtable_base_id.clone().unwrap_or_default();
        info!("Airtable sink initialized (table: {})", config.airtable_table);
        Arc::new(AirtableSink::new(token, &base_id, &config.airtable_table))
    } else {
        warn!("Airtable not configured (AIRTABLE_TOKEN/AIRTABLE_BASE_ID missing); records will not be stored");
        Arc::new(DryRunSink)
    };

    let pipeline = Pipeline::new(model, sink);
    let report = pipeline.run_batch(&files).await;

    print_summary(&report);

    if report.aborted() {
        std::process::exit(2);
    }
    Ok(())
}

/// Resolves the input path to a list of resume files. A directory yields
/// every directly-contained file with a recognized extension, sorted by
/// name; a single file is passed through as-is and rejected later by the
/// loader if its format is unsupported.
fn discover_files(path: &Path) -> Result<Vec<PathBuf>> {
    ensure!(path.exists(), "path not found: {}", path.display());

    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let entries = std::fs::read_dir(path)
        .with_context(|| format!("cannot read directory {}", path.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("cannot read directory {}", path.display()))?;
        let candidate = entry.path();
        if !candidate.is_file() {
            continue;
        }
        let recognized = candidate
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(DocumentFormat::from_extension)
            .is_some();
        if recognized {
            files.push(candidate);
        }
    }
    files.sort();
    Ok(files)
}

fn print_summary(report: &BatchReport) {
    println!("\n===== Import Summary =====");
    println!("Total documents : {}", report.results.len());
    println!("Accepted        : {}", report.summary.accepted);
    println!("Rejected        : {}", report.summary.rejected);
    println!("Skipped         : {}", report.summary.skipped);
    println!("==========================\n");

    for result in &report.results {
        let path = result.path.display();
        match &result.outcome {
            DocumentOutcome::Accepted { record, sink } => match sink {
                SinkStatus::Stored(SinkReceipt::Created(id)) => {
                    println!("[ACCEPTED] {path} -> {} (id={id})", record.name);
                }
                SinkStatus::Stored(SinkReceipt::AlreadyExists(key)) => {
                    println!("[ACCEPTED] {path} -> {} (already exists: {key})", record.name);
                }
                SinkStatus::Failed(message) => {
                    println!("[ACCEPTED] {path} -> {} (sink failed: {message})", record.name);
                }
            },
            DocumentOutcome::Rejected { error } => {
                println!("[REJECTED] {path} ({} stage) -> {error}", error.stage());
            }
            DocumentOutcome::Skipped => println!("[SKIPPED] {path}"),
        }
    }

    if let Some(fatal) = &report.fatal {
        eprintln!("Batch aborted: {fatal}");
    }
}
