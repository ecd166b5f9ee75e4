//! VRDU command-line interface.
//!
//! # Usage
//!
//! ```bash
//! # Extract fields from Tesseract TSV output
//! vrdu extract invoice.tsv --fields "Invoice Number,Date,Total" --table-fields Items
//!
//! # Print the recovered reading order of each page
//! vrdu order invoice.tsv
//!
//! # Start the HTTP server (feature "api")
//! vrdu serve -H 0.0.0.0 -p 8000
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use vrdu::fields::parse_field_list;
use vrdu::{Document, DocumentResult, FieldRequest, JobOrchestrator, JobStatus, VrduConfig, analyze_document};

#[derive(Parser)]
#[command(name = "vrdu")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Spatial field extraction from OCR word boxes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields from a word geometry file (.tsv or .json)
    Extract {
        /// Tesseract TSV output, or JSON `{"pages": [[word, ...], ...]}`
        file: PathBuf,

        /// Comma-separated field names
        #[arg(short, long)]
        fields: Option<String>,

        /// Comma-separated field names to reconstruct as tables
        #[arg(short, long = "table-fields")]
        table_fields: Option<String>,

        /// Path to a vrdu.toml / .yaml / .json config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Print the reading order of each page
    Order {
        file: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Start the HTTP API server
    #[cfg(feature = "api")]
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1", env = "VRDU_HOST")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8000", env = "VRDU_PORT")]
        port: u16,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn load_config(path: Option<&Path>) -> Result<VrduConfig> {
    match path {
        Some(path) => VrduConfig::from_file(path).with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(VrduConfig::discover()?.unwrap_or_default()),
    }
}

fn load_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let document = if is_json {
        Document::from_json(&text)?
    } else {
        Document::from_tsv(&text)?
    };

    let name = path.file_name().map(|name| name.to_string_lossy().into_owned());
    Ok(match name {
        Some(name) => document.with_name(name),
        None => document,
    })
}

fn field_requests(fields: Option<&str>, table_fields: Option<&str>) -> Vec<FieldRequest> {
    let mut requests = fields.map(parse_field_list).unwrap_or_default();
    if let Some(table_fields) = table_fields {
        requests.extend(parse_field_list(table_fields).into_iter().map(FieldRequest::as_table));
    }
    requests
}

fn print_text(result: &DocumentResult) {
    for field in result.fields.values() {
        let value = field.value.as_deref().unwrap_or("-");
        let page = field.page.map(|page| format!(" (page {})", page)).unwrap_or_default();
        println!(
            "{}: {} [{:?}, confidence {:.2}]{}",
            field.field_name, value, field.status, field.confidence, page
        );

        if let Some(table) = &field.table {
            for row in &table.rows {
                println!("    {}", row.join(" | "));
            }
        }
    }

    for skipped in &result.metadata.skipped_pages {
        eprintln!("warning: page {} skipped: {}", skipped.page, skipped.reason);
    }
}

async fn run_extract(
    file: PathBuf,
    fields: Option<String>,
    table_fields: Option<String>,
    config: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let document = load_document(&file)?;
    let requests = field_requests(fields.as_deref(), table_fields.as_deref());

    let orchestrator = JobOrchestrator::start(config)?;
    let id = orchestrator.submit(document, requests)?;
    let job = orchestrator.wait(&id).await.context("Job disappeared before finishing")?;
    orchestrator.shutdown().await;

    if job.status == JobStatus::Failed {
        let message = job.error.map(|failure| failure.message).unwrap_or_default();
        bail!("Extraction failed: {}", message);
    }

    let result = job.result.context("Completed job has no result")?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text(&result),
    }
    Ok(())
}

async fn run_order(file: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let document = load_document(&file)?;

    for summary in analyze_document(document, &config).await? {
        let note = if summary.fallback_order { " (arrival order)" } else { "" };
        println!("--- page {}: {} words{}", summary.page, summary.word_count, note);
        println!("{}", summary.reading_text);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            file,
            fields,
            table_fields,
            config,
            format,
        } => run_extract(file, fields, table_fields, config, format).await,
        Commands::Order { file, config } => run_order(file, config).await,
        #[cfg(feature = "api")]
        Commands::Serve { host, port, config } => {
            let config = load_config(config.as_deref())?;
            vrdu::api::serve_with_config(host, port, config).await?;
            Ok(())
        }
    }
}
