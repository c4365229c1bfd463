//! Core library for Hungarian document field extraction.
//!
//! This crate provides:
//! - OCR text normalization and label scanning
//! - Date and machine-readable zone (MRZ) recognizers
//! - Rule sets for ID cards, driving licenses, address cards, passports,
//!   vehicle registration certificates and certificates of conformity
//! - Canonicalization into fixed personal and vehicle payloads

pub mod documents;
pub mod engine;
pub mod error;
pub mod models;
pub mod ocr;
pub mod postprocess;
pub mod rules;
pub mod schema;
pub mod text;

pub use engine::{DocumentExtractor, DocumentParser};
pub use error::{DocfieldError, Result};
pub use models::{
    DocType, DocfieldConfig, DocumentFields, ExtractionResult, PayloadCategory, PersonalData,
    ProcessResponse, UnifiedPayload, VehicleData,
};
pub use ocr::{OcrPage, OcrResponse};
pub use schema::{unify, unify_fields};
