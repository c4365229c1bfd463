//! Per-kind rule sets.
//!
//! Each submodule turns the normalized lines of one document kind into its
//! field record. Rule sets are total: missing labels and garbage text
//! simply leave fields unset.

pub mod address_card;
pub mod coc;
pub mod driving_license;
pub mod id_back;
pub mod id_front;
pub mod id_old_back;
pub mod id_old_front;
pub mod passport;
pub mod registration;

use tracing::debug;

use crate::models::{DocType, DocumentFields};
use crate::text::NormalizedText;

/// Knobs shared by the rule sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleOptions {
    /// Century pivot for MRZ birth dates; the current year when unset.
    pub mrz_reference_year: Option<i32>,
    /// Occurrences required before a registration document number is trusted.
    pub registration_min_repeats: usize,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            mrz_reference_year: None,
            registration_min_repeats: 2,
        }
    }
}

/// Output of one rule set: the document number plus the kind's record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted<F> {
    pub document_number: Option<String>,
    pub fields: F,
}

/// Rule-set output with the record wrapped in [`DocumentFields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExtraction {
    pub document_number: Option<String>,
    pub fields: DocumentFields,
}

impl<F> Extracted<F> {
    fn wrap(self, variant: impl FnOnce(F) -> DocumentFields) -> RawExtraction {
        RawExtraction {
            document_number: self.document_number,
            fields: variant(self.fields),
        }
    }
}

/// Run the rule set for `doc_type`.
pub fn extract_fields(doc_type: DocType, text: &NormalizedText<'_>, opts: &RuleOptions) -> RawExtraction {
    debug!(%doc_type, lines = text.lines().len(), "running rule set");
    match doc_type {
        DocType::IdFront => id_front::extract(text).wrap(DocumentFields::IdFront),
        DocType::IdBack => id_back::extract(text, opts).wrap(DocumentFields::IdBack),
        DocType::IdOldFront => id_old_front::extract(text).wrap(DocumentFields::IdOldFront),
        DocType::IdOldBack => id_old_back::extract(text).wrap(DocumentFields::IdOldBack),
        DocType::DrivingLicense => {
            driving_license::extract(text).wrap(DocumentFields::DrivingLicense)
        }
        DocType::AddressCard => address_card::extract(text).wrap(DocumentFields::AddressCard),
        DocType::Passport => passport::extract(text).wrap(DocumentFields::Passport),
        DocType::Registration => {
            registration::extract(text, opts).wrap(DocumentFields::Registration)
        }
        DocType::Coc => coc::extract(text).wrap(DocumentFields::Coc),
    }
}

/// First whitespace-separated token with surrounding punctuation removed.
pub(crate) fn first_token(s: &str) -> Option<String> {
    let token = s
        .split_whitespace()
        .next()?
        .trim_matches(|c| matches!(c, '.' | ',' | ';' | ':'));
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// True if `s` is non-empty and consists of letters only.
pub(crate) fn is_alpha(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphabetic)
}
