//! Extract command - pull fields out of a single OCR result.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use docfield_core::{DocType, DocumentExtractor, DocumentParser};

use super::{format_response, load_config, parse_doc_type, read_ocr_text, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// OCR text, markdown or cached OCR JSON payload
    #[arg(required = true)]
    input: PathBuf,

    /// Document type (e.g. ID_FRONT, ADDRESS_CARD, REGISTRATION)
    #[arg(short = 't', long, value_parser = parse_doc_type)]
    doc_type: DocType,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Include extraction warnings in the response
    #[arg(long)]
    warnings: bool,

    /// Show the confidence score and processing time
    #[arg(long)]
    show_confidence: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.warnings {
        config.output.include_warnings = true;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());
    let text = read_ocr_text(&args.input, &config.ocr)?;

    let parser = DocumentExtractor::new().with_config(config.extraction.clone());
    let result = parser.parse(args.doc_type, &text);
    let response = result.to_response(&config.output);

    let output = format_response(&response, args.format, &config.output)?;

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

    if args.show_confidence {
        println!();
        println!(
            "{} Extraction confidence: {:.1}%",
            style("ℹ").blue(),
            result.confidence * 100.0
        );
        println!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            result.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
