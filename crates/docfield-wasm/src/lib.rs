//! WASM bindings for Hungarian document field extraction.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.

use js_sys::Array;
use wasm_bindgen::prelude::*;

use docfield_core::models::config::OutputConfig;
use docfield_core::postprocess;
use docfield_core::rules::{check_digit, first_date};
use docfield_core::text::{normalize_id_number, normalize_sex};
use docfield_core::{DocType, DocumentExtractor, DocumentParser, OcrResponse, ProcessResponse};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_doc_type(doc_type: &str) -> Result<DocType, JsValue> {
    doc_type.parse::<DocType>().map_err(to_js_error)
}

/// Extract fields from OCR text.
///
/// Returns the fixed-shape response: `doc_type`, `document_number`,
/// `is_correct_document`, `confidence` and `personal_data` or `vehicle_data`.
#[wasm_bindgen]
pub fn extract_from_text(doc_type: &str, text: &str) -> Result<JsValue, JsValue> {
    DocumentExtractorJs::new().extract(doc_type, text)
}

/// Extract fields from a cached OCR provider payload (JSON).
#[wasm_bindgen]
pub fn extract_from_ocr_payload(doc_type: &str, payload: &str) -> Result<JsValue, JsValue> {
    let response = OcrResponse::from_json(payload).map_err(to_js_error)?;
    extract_from_text(doc_type, &response.text())
}

/// Canonical field names of a document type.
#[wasm_bindgen]
pub fn field_names(doc_type: &str) -> Result<Array, JsValue> {
    let doc_type = parse_doc_type(doc_type)?;
    Ok(doc_type
        .field_names()
        .iter()
        .map(|name| JsValue::from_str(name))
        .collect())
}

/// Supported document type tags.
#[wasm_bindgen]
pub fn doc_types() -> Array {
    DocType::ALL
        .iter()
        .map(|doc_type| JsValue::from_str(doc_type.as_str()))
        .collect()
}

/// Earliest date in any of the recognized layouts, as `YYYY-MM-DD`.
#[wasm_bindgen]
pub fn parse_date(date_str: &str) -> Option<String> {
    first_date(date_str)
}

/// Canonicalize a vehicle identification number.
#[wasm_bindgen]
pub fn canonical_vin(vin: &str) -> Option<String> {
    postprocess::canonical_vin(vin)
}

/// Canonicalize an ID card number to `ddddddXX`.
#[wasm_bindgen]
pub fn canonical_id_number(number: &str) -> Option<String> {
    normalize_id_number(number)
}

/// Map a sex marker onto `NŐ` or `FÉRFI`.
#[wasm_bindgen]
pub fn canonical_sex(sex: &str) -> Option<String> {
    normalize_sex(sex).map(str::to_string)
}

/// ICAO 9303 check digit of an MRZ field.
#[wasm_bindgen]
pub fn mrz_check_digit(field: &str) -> u32 {
    check_digit(field)
}

/// Document extractor class for browser use.
#[wasm_bindgen(js_name = DocumentExtractor)]
pub struct DocumentExtractorJs {
    extractor: DocumentExtractor,
    output: OutputConfig,
}

#[wasm_bindgen(js_class = DocumentExtractor)]
impl DocumentExtractorJs {
    /// Create a new document extractor.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            extractor: DocumentExtractor::new(),
            output: OutputConfig::default(),
        }
    }

    /// Pin the MRZ century pivot year.
    #[wasm_bindgen]
    pub fn set_reference_year(&mut self, year: Option<i32>) {
        self.extractor = self.extractor.clone().with_reference_year(year);
    }

    /// Occurrences required before a registration number is trusted.
    #[wasm_bindgen]
    pub fn set_registration_min_repeats(&mut self, repeats: usize) {
        self.extractor = self.extractor.clone().with_registration_min_repeats(repeats);
    }

    /// Include extraction warnings in responses.
    #[wasm_bindgen]
    pub fn set_include_warnings(&mut self, include: bool) {
        self.output.include_warnings = include;
    }

    /// Extract fields from OCR text.
    #[wasm_bindgen]
    pub fn extract(&self, doc_type: &str, text: &str) -> Result<JsValue, JsValue> {
        let doc_type = parse_doc_type(doc_type)?;
        let response = self.extractor.parse(doc_type, text).to_response(&self.output);
        serde_wasm_bindgen::to_value(&response).map_err(to_js_error)
    }

    /// Get the full extraction result with per-kind fields and metadata.
    #[wasm_bindgen]
    pub fn extract_with_metadata(&self, doc_type: &str, text: &str) -> Result<JsValue, JsValue> {
        let output = self.metadata(parse_doc_type(doc_type)?, text).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&output).map_err(to_js_error)
    }
}

/// Response plus raw fields. Warnings are reported once, at the top level.
#[derive(serde::Serialize)]
struct ExtractMetadata {
    response: ProcessResponse,
    fields: serde_json::Value,
    warnings: Vec<String>,
    processing_time_ms: u64,
}

impl DocumentExtractorJs {
    fn metadata(&self, doc_type: DocType, text: &str) -> serde_json::Result<ExtractMetadata> {
        let result = self.extractor.parse(doc_type, text);
        let mut response = result.to_response(&self.output);
        response.warnings.clear();
        Ok(ExtractMetadata {
            response,
            fields: serde_json::to_value(&result.fields)?,
            warnings: result.warnings,
            processing_time_ms: result.processing_time_ms,
        })
    }
}

impl Default for DocumentExtractorJs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_mrz_check_digit() {
        assert_eq!(mrz_check_digit("790630"), 7);
    }

    #[wasm_bindgen_test]
    fn test_canonical_helpers() {
        assert_eq!(parse_date("2031.08.12.").as_deref(), Some("2031-08-12"));
        assert_eq!(canonical_id_number("I23456 AB").as_deref(), Some("123456AB"));
        assert_eq!(canonical_sex("NŐ/F").as_deref(), Some("NŐ"));
        assert_eq!(canonical_vin("VIN WVWZZZ1KZ6W000001").as_deref(), Some("WVWZZZ1KZ6W000001"));
    }

    #[wasm_bindgen_test]
    fn test_field_names() {
        assert_eq!(field_names("COC").unwrap().length(), 12);
        assert!(field_names("LIBRARY_CARD").is_err());
        assert_eq!(doc_types().length(), 9);
    }

    #[wasm_bindgen_test]
    fn test_metadata_reports_warnings_once() {
        let mut extractor = DocumentExtractorJs::new();
        extractor.set_include_warnings(true);
        let output = extractor.metadata(DocType::Passport, "").unwrap();
        assert!(!output.warnings.is_empty());
        assert!(output.response.warnings.is_empty());
    }
}
