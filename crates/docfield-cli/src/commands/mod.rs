//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod fields;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use docfield_core::models::config::{OcrConfig, OutputConfig};
use docfield_core::{DocType, DocfieldConfig, OcrResponse, ProcessResponse};

/// Output format for extraction results.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON response
    Json,
    /// CSV row with header
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Clap value parser for document-type tags.
pub fn parse_doc_type(s: &str) -> Result<DocType, String> {
    s.parse::<DocType>().map_err(|e| e.to_string())
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docfield")
        .join("config.json")
}

/// Load `--config` when given, else the default config file if one exists.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DocfieldConfig> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => {
            let path = default_config_path();
            if !path.exists() {
                return Ok(DocfieldConfig::default());
            }
            path
        }
    };
    debug!("Loading configuration from {}", path.display());
    Ok(DocfieldConfig::from_file(&path)?)
}

/// Read OCR output from disk.
///
/// `.json` files are decoded as cached provider payloads, anything else is
/// taken as plain text or markdown. A payload recorded with OCR settings
/// other than `ocr` is still used, with a warning.
pub fn read_ocr_text(path: &Path, ocr: &OcrConfig) -> anyhow::Result<String> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let response = OcrResponse::from_json(&content)?;
        debug!(
            "Decoded OCR payload with {} pages from {}",
            response.pages.len(),
            path.display()
        );
        for mismatch in response.config_mismatches(ocr) {
            warn!("{}: OCR payload {}", path.display(), mismatch);
        }
        Ok(response.text())
    } else {
        Ok(content)
    }
}

pub fn format_response(
    response: &ProcessResponse,
    format: OutputFormat,
    output: &OutputConfig,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if output.pretty => Ok(serde_json::to_string_pretty(response)?),
        OutputFormat::Json => Ok(serde_json::to_string(response)?),
        OutputFormat::Csv => format_csv(response),
        OutputFormat::Text => Ok(format_text(response)),
    }
}

pub fn csv_header(response: &ProcessResponse) -> Vec<String> {
    let mut header: Vec<String> = ["doc_type", "document_number", "is_correct_document", "confidence"]
        .into_iter()
        .map(String::from)
        .collect();
    header.extend(response.payload.entries().into_iter().map(|(k, _)| k.to_string()));
    header
}

pub fn csv_row(response: &ProcessResponse) -> Vec<String> {
    let mut row = vec![
        response.doc_type.to_string(),
        response.document_number.clone().unwrap_or_default(),
        response.is_correct_document.to_string(),
        response.confidence.to_string(),
    ];
    row.extend(
        response
            .payload
            .entries()
            .into_iter()
            .map(|(_, v)| v.unwrap_or_default().to_string()),
    );
    row
}

fn format_csv(response: &ProcessResponse) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(csv_header(response))?;
    wtr.write_record(csv_row(response))?;
    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(response: &ProcessResponse) -> String {
    let mut output = String::new();

    output.push_str(&format!("Document: {}\n", response.doc_type));
    output.push_str(&format!(
        "Number: {}\n",
        response.document_number.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!("Confidence: {}\n", response.confidence));
    output.push('\n');

    output.push_str(&format!("{}:\n", response.payload.category().key()));
    for (key, value) in response.payload.entries() {
        output.push_str(&format!("  {}: {}\n", key, value.unwrap_or("-")));
    }

    if !response.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &response.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
