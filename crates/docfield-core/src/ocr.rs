//! OCR provider payloads.
//!
//! The OCR call itself happens elsewhere; this module only decodes the
//! provider's raw JSON response (as kept in the OCR cache) and turns it
//! into the text the extraction engine consumes.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::config::OcrConfig;

/// One recognized page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrPage {
    /// Zero-based page index.
    #[serde(default)]
    pub index: usize,

    /// Page content rendered as markdown.
    #[serde(default)]
    pub markdown: String,
}

/// Raw OCR provider response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub pages: Vec<OcrPage>,

    /// Model that produced the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Table rendering recorded next to the cached response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_format: Option<String>,
}

impl OcrResponse {
    /// Decode a provider response.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Page markdown joined by a blank line, empty pages dropped.
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.markdown.trim())
            .filter(|markdown| !markdown.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
            .trim()
            .to_string()
    }

    /// Settings this payload was produced with that differ from `config`.
    ///
    /// Settings the payload does not record are not compared.
    pub fn config_mismatches(&self, config: &OcrConfig) -> Vec<String> {
        let recorded = [
            ("model", self.model.as_deref(), config.model.as_str()),
            (
                "table_format",
                self.table_format.as_deref(),
                config.table_format.as_str(),
            ),
        ];
        recorded
            .into_iter()
            .filter_map(|(key, got, expected)| {
                let got = got?;
                (got != expected).then(|| format!("{key} {got:?}, configured {expected:?}"))
            })
            .collect()
    }
}
