//! Batch processing command for multiple invoice files.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use docflow_core::{Document, DocumentPipeline, DocumentStatus};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: super::process::OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct BatchEntry {
    path: PathBuf,
    document: Option<Document>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;
    let pipeline = super::build_pipeline(&config)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut entries = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = process_single_file(&pipeline, &path);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(document) => {
                entries.push(BatchEntry {
                    path: path.clone(),
                    document: Some(document),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    entries.push(BatchEntry {
                        path: path.clone(),
                        document: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    // Write per-file outputs
    if let Some(ref output_dir) = args.output_dir {
        for entry in &entries {
            let Some(document) = &entry.document else {
                continue;
            };

            let output_name = entry
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");

            let extension = match args.format {
                super::process::OutputFormat::Json => "json",
                super::process::OutputFormat::Csv => "csv",
                super::process::OutputFormat::Text => "txt",
            };

            let output_path = output_dir.join(format!("{}.{}", output_name, extension));
            let content = super::process::format_document(document, args.format)?;

            fs::write(&output_path, content)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    // Generate summary if requested
    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &entries)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    // A Failed document is a completed run whose validation rejected the
    // file; only pipeline faults count as processing errors here.
    let validated = entries
        .iter()
        .filter(|e| {
            e.document
                .as_ref()
                .is_some_and(|d| d.status == DocumentStatus::Validated)
        })
        .count();
    let rejected = entries
        .iter()
        .filter(|e| {
            e.document
                .as_ref()
                .is_some_and(|d| d.status == DocumentStatus::Failed)
        })
        .count();
    let errored: Vec<_> = entries.iter().filter(|e| e.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        entries.len(),
        start.elapsed()
    );
    println!(
        "   {} validated, {} rejected, {} errors",
        style(validated).green(),
        style(rejected).yellow(),
        style(errored.len()).red()
    );

    if !errored.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for entry in &errored {
            println!(
                "  - {}: {}",
                entry.path.display(),
                entry.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(pipeline: &DocumentPipeline, path: &PathBuf) -> anyhow::Result<Document> {
    let bytes = fs::read(path)?;
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");

    let document = pipeline.upload(&bytes, filename)?;
    Ok(pipeline.process(&document.id)?)
}

fn write_summary(path: &PathBuf, entries: &[BatchEntry]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "invoice_number",
        "invoice_date",
        "total_amount",
        "confidence",
        "processing_time_ms",
        "error",
    ])?;

    for entry in entries {
        let filename = entry
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(document) = &entry.document {
            let metadata = document.metadata.as_ref();
            wtr.write_record([
                filename,
                &document.status.to_string(),
                metadata
                    .and_then(|m| m.invoice_number.as_deref())
                    .unwrap_or(""),
                &metadata
                    .and_then(|m| m.invoice_date)
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                &metadata
                    .and_then(|m| m.total_amount)
                    .map(|a| a.to_string())
                    .unwrap_or_default(),
                &document
                    .recognition
                    .as_ref()
                    .map(|r| format!("{:.2}", r.confidence))
                    .unwrap_or_default(),
                &entry.processing_time_ms.to_string(),
                document.errors.join("; ").as_str(),
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                &entry.processing_time_ms.to_string(),
                entry.error.as_deref().unwrap_or("unknown error"),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
