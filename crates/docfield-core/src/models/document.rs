//! Document kinds and extraction results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fields::{
    AddressCardFields, CocFields, DocumentFields, DrivingLicenseFields, IdBackFields,
    IdFrontFields, IdOldBackFields, IdOldFrontFields, PassportFields, PersonalData,
    RegistrationFields, VehicleData,
};
use crate::error::DocfieldError;

/// Supported document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocType {
    IdFront,
    IdBack,
    IdOldFront,
    IdOldBack,
    DrivingLicense,
    AddressCard,
    Passport,
    Registration,
    Coc,
}

impl DocType {
    pub const ALL: [DocType; 9] = [
        DocType::IdFront,
        DocType::IdBack,
        DocType::IdOldFront,
        DocType::IdOldBack,
        DocType::DrivingLicense,
        DocType::AddressCard,
        DocType::Passport,
        DocType::Registration,
        DocType::Coc,
    ];

    /// Wire tag, e.g. `ID_OLD_FRONT`.
    pub fn as_str(self) -> &'static str {
        match self {
            DocType::IdFront => "ID_FRONT",
            DocType::IdBack => "ID_BACK",
            DocType::IdOldFront => "ID_OLD_FRONT",
            DocType::IdOldBack => "ID_OLD_BACK",
            DocType::DrivingLicense => "DRIVING_LICENSE",
            DocType::AddressCard => "ADDRESS_CARD",
            DocType::Passport => "PASSPORT",
            DocType::Registration => "REGISTRATION",
            DocType::Coc => "COC",
        }
    }

    /// Output payload shape for this kind.
    pub fn category(self) -> PayloadCategory {
        match self {
            DocType::Registration | DocType::Coc => PayloadCategory::Vehicle,
            _ => PayloadCategory::Personal,
        }
    }

    /// Canonical field names produced for this kind, excluding `document_number`.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            DocType::IdFront => IdFrontFields::FIELDS,
            DocType::IdBack => IdBackFields::FIELDS,
            DocType::IdOldFront => IdOldFrontFields::FIELDS,
            DocType::IdOldBack => IdOldBackFields::FIELDS,
            DocType::DrivingLicense => DrivingLicenseFields::FIELDS,
            DocType::AddressCard => AddressCardFields::FIELDS,
            DocType::Passport => PassportFields::FIELDS,
            DocType::Registration => RegistrationFields::FIELDS,
            DocType::Coc => CocFields::FIELDS,
        }
    }

    /// Whether the rule set reports a top-level document number.
    pub fn has_document_number(self) -> bool {
        !matches!(self, DocType::Coc)
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = DocfieldError;

    /// Accepts the wire tag in any case, with `-` or `_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_uppercase().replace('-', "_");
        DocType::ALL
            .into_iter()
            .find(|doc_type| doc_type.as_str() == tag)
            .ok_or_else(|| DocfieldError::UnknownDocType(s.to_string()))
    }
}

/// The two fixed output shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadCategory {
    Personal,
    Vehicle,
}

impl PayloadCategory {
    /// Key under which the payload is reported.
    pub fn key(self) -> &'static str {
        match self {
            PayloadCategory::Personal => "personal_data",
            PayloadCategory::Vehicle => "vehicle_data",
        }
    }

    /// Complete key set of the shape.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            PayloadCategory::Personal => PersonalData::FIELDS,
            PayloadCategory::Vehicle => VehicleData::FIELDS,
        }
    }
}

/// Result of running one document through the extraction pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub doc_type: DocType,
    /// Reported here rather than inside `fields`.
    pub document_number: Option<String>,
    /// Placeholder; always `true`.
    pub is_correct_document: bool,
    /// Placeholder; derived only from whether any text was present.
    pub confidence: f32,
    pub fields: DocumentFields,
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
}

/// Unified, fixed-shape payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnifiedPayload {
    #[serde(rename = "personal_data")]
    Personal(PersonalData),
    #[serde(rename = "vehicle_data")]
    Vehicle(VehicleData),
}

impl UnifiedPayload {
    pub fn category(&self) -> PayloadCategory {
        match self {
            UnifiedPayload::Personal(_) => PayloadCategory::Personal,
            UnifiedPayload::Vehicle(_) => PayloadCategory::Vehicle,
        }
    }

    pub fn entries(&self) -> Vec<(&'static str, Option<&str>)> {
        match self {
            UnifiedPayload::Personal(data) => data.entries(),
            UnifiedPayload::Vehicle(data) => data.entries(),
        }
    }
}

/// Final response handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub doc_type: DocType,
    pub document_number: Option<String>,
    pub is_correct_document: bool,
    pub confidence: f64,
    #[serde(flatten)]
    pub payload: UnifiedPayload,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
