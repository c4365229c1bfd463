//! Data models: document kinds, field records and configuration.

pub mod config;
pub mod document;
pub mod fields;

pub use config::DocfieldConfig;
pub use document::{DocType, ExtractionResult, PayloadCategory, ProcessResponse, UnifiedPayload};
pub use fields::{DocumentFields, PersonalData, VehicleData};
