//! Extraction pipeline: normalize, run the kind's rule set, canonicalize.

use std::time::Instant;

use tracing::{debug, info};

use crate::documents::{extract_fields, RuleOptions};
use crate::models::config::{ExtractionConfig, OutputConfig};
use crate::models::{DocType, ExtractionResult, ProcessResponse};
use crate::postprocess::postprocess;
use crate::schema::unify_fields;
use crate::text::NormalizedText;

/// Trait for document parsing.
pub trait DocumentParser {
    /// Extract the fields of a `doc_type` document from its OCR text.
    fn parse(&self, doc_type: DocType, text: &str) -> ExtractionResult;
}

/// Rule-based document extractor.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtractor {
    config: ExtractionConfig,
}

impl DocumentExtractor {
    /// Create an extractor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given extraction configuration.
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Pin the MRZ century pivot year.
    pub fn with_reference_year(mut self, year: Option<i32>) -> Self {
        self.config.mrz_reference_year = year;
        self
    }

    /// Set how often a registration number must be printed.
    pub fn with_registration_min_repeats(mut self, repeats: usize) -> Self {
        self.config.registration_min_repeats = repeats;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn rule_options(&self) -> RuleOptions {
        RuleOptions {
            mrz_reference_year: self.config.mrz_reference_year,
            registration_min_repeats: self.config.registration_min_repeats,
        }
    }

    /// Stub score: only says whether OCR produced any text at all.
    fn confidence(&self, text: &NormalizedText<'_>) -> f32 {
        if text.is_empty() {
            self.config.confidence_without_text
        } else {
            self.config.confidence_with_text
        }
    }

    /// Run the full pipeline on one OCR text.
    pub fn extract(&self, doc_type: DocType, text: &str) -> ExtractionResult {
        let start = Instant::now();
        info!(%doc_type, chars = text.len(), "extracting fields");

        let normalized = NormalizedText::new(text);
        let raw = extract_fields(doc_type, &normalized, &self.rule_options());
        let canonical = postprocess(raw);

        let mut warnings = Vec::new();
        if doc_type.has_document_number() && canonical.document_number.is_none() {
            warnings.push("document_number: not found".to_string());
        }
        warnings.extend(
            canonical
                .fields
                .missing()
                .into_iter()
                .map(|field| format!("{field}: not found")),
        );
        warnings.extend(canonical.rejections);

        let confidence = self.confidence(&normalized);
        if confidence < self.config.confidence_threshold {
            warnings.push(format!(
                "low confidence: {confidence:.2} < {:.2}",
                self.config.confidence_threshold
            ));
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        let populated = canonical.fields.populated().len();
        debug!(%doc_type, warnings = warnings.len(), "postprocess done");
        info!(%doc_type, populated, processing_time_ms, "extraction finished");

        ExtractionResult {
            doc_type,
            document_number: canonical.document_number,
            is_correct_document: true,
            confidence,
            fields: canonical.fields,
            warnings,
            processing_time_ms,
        }
    }
}

impl DocumentParser for DocumentExtractor {
    fn parse(&self, doc_type: DocType, text: &str) -> ExtractionResult {
        self.extract(doc_type, text)
    }
}

impl ExtractionResult {
    /// Fixed-shape response, confidence rounded per `output`.
    pub fn to_response(&self, output: &OutputConfig) -> ProcessResponse {
        let scale = 10f64.powi(output.confidence_decimals as i32);
        ProcessResponse {
            doc_type: self.doc_type,
            document_number: self.document_number.clone(),
            is_correct_document: self.is_correct_document,
            confidence: (f64::from(self.confidence) * scale).round() / scale,
            payload: unify_fields(self.doc_type, &self.fields),
            warnings: if output.include_warnings {
                self.warnings.clone()
            } else {
                Vec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnifiedPayload;
    use pretty_assertions::assert_eq;

    const ID_BACK: &str = "\
SZÜLETÉSI HELY / PLACE OF BIRTH
BUDAPEST
ANYJA SZÜLETÉSI NEVE / MOTHER'S MAIDEN NAME
NAGY MÁRIA
IDHUN123456AB<8<<<<<<<<<<<<<<<
7906307F3108125HUN<<<<<<<<<<<4
KOVACS<<JANOS<PETER<<<<<<<<<<<
";

    #[test]
    fn test_every_kind_is_total() {
        let extractor = DocumentExtractor::new();
        for text in ["", "???", "\u{0}\u{7f} ||| ###", "A\nB\nC\nD.1\nE"] {
            for doc_type in DocType::ALL {
                let result = extractor.extract(doc_type, text);
                let response = result.to_response(&OutputConfig::default());
                assert_eq!(
                    response.payload.entries().len(),
                    doc_type.category().field_names().len()
                );
                assert!(result.is_correct_document);
            }
        }
    }

    #[test]
    fn test_confidence_stub() {
        let extractor = DocumentExtractor::new();
        assert_eq!(extractor.extract(DocType::IdFront, "  \n ").confidence, 0.0);
        assert_eq!(extractor.extract(DocType::IdFront, "x").confidence, 0.5);
    }

    #[test]
    fn test_warnings_list_missing_fields() {
        let result = DocumentExtractor::new().extract(DocType::IdOldFront, "");
        assert!(result.warnings.contains(&"document_number: not found".to_string()));
        assert!(result.warnings.contains(&"full_name: not found".to_string()));
        assert!(result.warnings.iter().any(|w| w.starts_with("low confidence")));

        let coc = DocumentExtractor::new().extract(DocType::Coc, "");
        assert!(!coc.warnings.iter().any(|w| w.starts_with("document_number")));
    }

    #[test]
    fn test_id_back_response() {
        let result = DocumentExtractor::new()
            .with_reference_year(Some(2026))
            .extract(DocType::IdBack, ID_BACK);
        assert_eq!(result.document_number.as_deref(), Some("123456AB"));

        let response = result.to_response(&OutputConfig::default());
        assert_eq!(response.confidence, 0.5);
        assert!(response.warnings.is_empty());
        let UnifiedPayload::Personal(data) = response.payload else {
            panic!("expected personal data");
        };
        assert_eq!(data.full_name.as_deref(), Some("KOVACS JANOS PETER"));
        assert_eq!(data.birth_date.as_deref(), Some("1979-06-30"));
        assert_eq!(data.birth_place.as_deref(), Some("BUDAPEST"));
        assert_eq!(data.mothers_name.as_deref(), Some("NAGY MÁRIA"));
        assert_eq!(data.expiry_date, None);
    }

    #[test]
    fn test_foreign_address_card() {
        let text = "\
SZÜLETÉSI HELY, IDŐ: SZEGED, MAGYARORSZÁG 1979.06.30
ANYJA NEVE: NAGY MÁRIA
LAKÓHELY: Külföldi cím
BEJELENTÉSI IDŐ: 2010.01.02
";
        let result = DocumentExtractor::new().extract(DocType::AddressCard, text);
        assert_eq!(result.fields.get("permanent_address"), Some("Külföldi cím"));
        assert_eq!(result.fields.get("permanent_reporting_time"), None);
        assert_eq!(result.fields.get("birth_place"), None);
        assert_eq!(result.fields.get("birth_date"), Some("1979-06-30"));
        assert_eq!(result.fields.get("mothers_name"), Some("NAGY MÁRIA"));
        assert!(result
            .warnings
            .contains(&"permanent_reporting_time: cleared for a foreign address".to_string()));
        assert!(result
            .warnings
            .contains(&"birth_place: cleared for a foreign address".to_string()));
    }

    #[test]
    fn test_address_continuing_past_foreign_marker_is_kept() {
        let text = "\
SZÜLETÉSI HELY, IDŐ: SZEGED, MAGYARORSZÁG 1979.06.30
ANYJA NEVE: NAGY MÁRIA
LAKÓHELY: Külföldi cím
AUSZTRIA
BEJELENTÉSI IDŐ: 2010.01.02
";
        let result = DocumentExtractor::new().extract(DocType::AddressCard, text);
        assert_eq!(
            result.fields.get("permanent_address"),
            Some("Külföldi cím AUSZTRIA")
        );
        assert_eq!(result.fields.get("permanent_reporting_time"), Some("2010-01-02"));
        assert_eq!(result.fields.get("birth_place"), Some("SZEGED, MAGYARORSZÁG"));
        assert!(!result.warnings.iter().any(|w| w.contains("foreign address")));
    }

    #[test]
    fn test_registration_repeat_setting() {
        let text = "AB12345 forgalmi";
        let strict = DocumentExtractor::new().extract(DocType::Registration, text);
        assert_eq!(strict.document_number, None);
        let lenient = DocumentExtractor::new()
            .with_registration_min_repeats(1)
            .extract(DocType::Registration, text);
        assert_eq!(lenient.document_number.as_deref(), Some("AB12345"));
    }

    #[test]
    fn test_confidence_rounding_and_warnings_flag() {
        let config = ExtractionConfig {
            confidence_with_text: 0.123456,
            ..ExtractionConfig::default()
        };
        let result = DocumentExtractor::new()
            .with_config(config)
            .extract(DocType::Passport, "x");
        let output = OutputConfig {
            confidence_decimals: 2,
            include_warnings: true,
            ..OutputConfig::default()
        };
        let response = result.to_response(&output);
        assert_eq!(response.confidence, 0.12);
        assert!(!response.warnings.is_empty());
    }
}
