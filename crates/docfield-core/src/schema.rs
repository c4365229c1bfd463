//! Unification of per-kind records into the two fixed payload shapes.

use crate::models::{DocType, DocumentFields, PayloadCategory, PersonalData, UnifiedPayload, VehicleData};

/// Build the fixed-shape payload of `category` from `(name, value)` pairs.
///
/// Starts from the all-null template and overwrites only the names the
/// shape knows; anything else is dropped.
pub fn unify<'a>(
    category: PayloadCategory,
    entries: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
) -> UnifiedPayload {
    match category {
        PayloadCategory::Personal => UnifiedPayload::Personal(PersonalData::from_entries(entries)),
        PayloadCategory::Vehicle => UnifiedPayload::Vehicle(VehicleData::from_entries(entries)),
    }
}

/// Unify a kind's record into its category's payload.
pub fn unify_fields(doc_type: DocType, fields: &DocumentFields) -> UnifiedPayload {
    unify(doc_type.category(), fields.entries())
}
