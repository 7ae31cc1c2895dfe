//! Process command - run a single file through the pipeline.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docflow_core::{Document, DocumentPipeline, DocumentStatus, SimulatedEngine, Validator};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Show recognition confidence and timing
    #[arg(long)]
    show_confidence: bool,

    /// Show validation warnings alongside errors
    #[arg(long)]
    show_warnings: bool,

    /// Pin the simulated engine's confidence (demos and testing)
    #[arg(long)]
    confidence: Option<f64>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;
    let mut engine = SimulatedEngine::new();
    if let Some(confidence) = args.confidence {
        engine = engine.with_confidence(confidence);
    }
    let pipeline = super::build_pipeline_with_engine(&config, engine)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let document = run_pipeline(&pipeline, &args.input, &pb)?;

    pb.finish_with_message("Done");

    let output = format_document(&document, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if document.status == DocumentStatus::Failed {
        eprintln!("{}", style("Validation errors:").yellow());
        for error in &document.errors {
            eprintln!("  - {}", error);
        }
    }

    if args.show_warnings {
        // Warnings are not persisted on the record; re-run the (pure)
        // validator to surface them.
        let verdict = Validator::new(config.validation.clone()).validate(&document);
        if !verdict.warnings.is_empty() {
            eprintln!("{}", style("Validation warnings:").yellow());
            for warning in &verdict.warnings {
                eprintln!("  - {}", warning);
            }
        }
    }

    if args.show_confidence {
        if let Some(recognition) = &document.recognition {
            println!();
            println!(
                "{} Recognition confidence: {}",
                style("ℹ").blue(),
                recognition.confidence_percentage()
            );
            println!(
                "{} Recognition time: {}ms",
                style("ℹ").blue(),
                recognition.processing_time_ms
            );
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Upload the file and run one processing attempt.
pub(super) fn run_pipeline(
    pipeline: &DocumentPipeline,
    input: &PathBuf,
    pb: &ProgressBar,
) -> anyhow::Result<Document> {
    pb.set_message("Uploading...");
    pb.set_position(10);

    let bytes = fs::read(input)?;
    let filename = input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");
    let document = pipeline.upload(&bytes, filename)?;

    pb.set_message("Recognizing and validating...");
    pb.set_position(40);

    let document = pipeline.process(&document.id)?;

    pb.set_position(100);
    Ok(document)
}

pub(super) fn format_document(document: &Document, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(document)?),
        OutputFormat::Csv => format_csv(document),
        OutputFormat::Text => Ok(format_text(document)),
    }
}

fn format_csv(document: &Document) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "filename",
        "status",
        "invoice_number",
        "invoice_date",
        "total_amount",
        "item_count",
        "confidence",
        "errors",
    ])?;

    let metadata = document.metadata.as_ref();
    wtr.write_record([
        document.id.as_str(),
        document.filename.as_str(),
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
        &metadata.map(|m| m.item_count()).unwrap_or(0).to_string(),
        &document
            .recognition
            .as_ref()
            .map(|r| format!("{:.2}", r.confidence))
            .unwrap_or_default(),
        &document.errors.join("; "),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(document: &Document) -> String {
    let mut out = String::new();

    out.push_str(&format!("Document:  {}\n", document.filename));
    out.push_str(&format!(
        "Status:    {} ({})\n",
        document.status,
        document.status.description()
    ));
    out.push_str(&format!(
        "Uploaded:  {}\n",
        document.uploaded_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(processed_at) = document.processed_at {
        out.push_str(&format!(
            "Processed: {}\n",
            processed_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    if let Some(recognition) = &document.recognition {
        out.push_str(&format!(
            "Engine:    {} ({})\n",
            recognition.engine,
            recognition.confidence_percentage()
        ));
    }

    if let Some(metadata) = &document.metadata {
        out.push('\n');
        out.push_str(&format!(
            "Invoice #: {}\n",
            metadata.invoice_number.as_deref().unwrap_or("-")
        ));
        out.push_str(&format!(
            "Date:      {}\n",
            metadata
                .invoice_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string())
        ));
        out.push_str(&format!(
            "Total:     {}\n",
            metadata
                .total_amount
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string())
        ));

        if !metadata.line_items.is_empty() {
            out.push_str("\nItems:\n");
            for item in &metadata.line_items {
                out.push_str(&format!(
                    "  {} x {}  @ {}  = {}\n",
                    item.quantity, item.description, item.unit_price, item.total
                ));
            }
        }
    }

    if !document.errors.is_empty() {
        out.push_str("\nErrors:\n");
        for error in &document.errors {
            out.push_str(&format!("  - {}\n", error));
        }
    }

    out
}
