//! Configuration structures for the extraction pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DocfieldError, Result};

/// Main configuration for docfield.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocfieldConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Output formatting configuration.
    pub output: OutputConfig,

    /// OCR provider settings recorded alongside cached payloads.
    pub ocr: OcrConfig,
}

impl Default for DocfieldConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            output: OutputConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Year used as the MRZ birth-date century pivot (current year if unset).
    pub mrz_reference_year: Option<i32>,

    /// Confidence reported when OCR produced any text.
    pub confidence_with_text: f32,

    /// Confidence reported for empty OCR text.
    pub confidence_without_text: f32,

    /// Results below this confidence carry a warning.
    pub confidence_threshold: f32,

    /// How often a registration document number must be printed to be trusted.
    pub registration_min_repeats: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mrz_reference_year: None,
            confidence_with_text: 0.5,
            confidence_without_text: 0.0,
            confidence_threshold: 0.75,
            registration_min_repeats: 2,
        }
    }
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty: bool,

    /// Include extraction warnings in responses.
    pub include_warnings: bool,

    /// Decimal places kept for the confidence value.
    pub confidence_decimals: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            include_warnings: false,
            confidence_decimals: 4,
        }
    }
}

/// OCR provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Model name the cached payloads were produced with.
    pub model: String,

    /// Table rendering requested from the provider.
    pub table_format: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model: "mistral-ocr-latest".to_string(),
            table_format: "markdown".to_string(),
        }
    }
}

impl DocfieldConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| DocfieldError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| DocfieldError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = DocfieldConfig::default();
        assert_eq!(config.extraction.confidence_threshold, 0.75);
        assert_eq!(config.extraction.registration_min_repeats, 2);
        assert_eq!(config.ocr.model, "mistral-ocr-latest");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DocfieldConfig =
            serde_json::from_str(r#"{"extraction": {"mrz_reference_year": 2024}}"#).unwrap();
        assert_eq!(config.extraction.mrz_reference_year, Some(2024));
        assert_eq!(config.extraction.confidence_with_text, 0.5);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = DocfieldConfig::default();
        config.output.include_warnings = true;
        config.save(&path).unwrap();

        let loaded = DocfieldConfig::from_file(&path).unwrap();
        assert!(loaded.output.include_warnings);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            DocfieldConfig::from_file(&path),
            Err(DocfieldError::Config(_))
        ));
    }
}
