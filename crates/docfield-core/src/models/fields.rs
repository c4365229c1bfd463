//! Structured field records.
//!
//! Each document kind has a record with one optional string per canonical
//! field, so a field name is spelled exactly once. Records serialize with
//! every key present (`null` when unresolved).

use serde::{Deserialize, Serialize};

/// Declare a record of optional string fields with wire names.
macro_rules! field_record {
    (
        $(#[$meta:meta])*
        $name:ident { $($field:ident => $key:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            $(
                #[serde(rename = $key)]
                pub $field: Option<String>,
            )+
        }

        impl $name {
            /// Canonical field names, in output order.
            pub const FIELDS: &'static [&'static str] = &[$($key),+];

            /// Value of a field by canonical name.
            pub fn get(&self, key: &str) -> Option<&str> {
                match key {
                    $($key => self.$field.as_deref(),)+
                    _ => None,
                }
            }

            /// Set a field by canonical name. Unknown names are ignored and
            /// reported as `false`.
            pub fn set(&mut self, key: &str, value: Option<String>) -> bool {
                match key {
                    $($key => {
                        self.$field = value;
                        true
                    })+
                    _ => false,
                }
            }

            /// `(name, value)` for every field, in output order.
            pub fn entries(&self) -> Vec<(&'static str, Option<&str>)> {
                vec![$(($key, self.$field.as_deref())),+]
            }

            /// Visit every field mutably.
            pub fn for_each_mut(&mut self, mut f: impl FnMut(&'static str, &mut Option<String>)) {
                $(f($key, &mut self.$field);)+
            }

            /// Build from `(name, value)` pairs, keeping only known names.
            pub fn from_entries<'a>(
                entries: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
            ) -> Self {
                let mut out = Self::default();
                for (key, value) in entries {
                    out.set(key, value.map(str::to_string));
                }
                out
            }
        }
    };
}

field_record! {
    /// New-format ID card, front side.
    IdFrontFields {
        full_name => "full_name",
        sex => "sex",
        nationality => "nationality",
        birth_date => "birth_date",
        expiry_date => "expiry_date",
    }
}

field_record! {
    /// New-format ID card, back side.
    IdBackFields {
        full_name => "full_name",
        birth_date => "birth_date",
        birth_place => "birth_place",
        birth_name => "birth_name",
        mothers_name => "mothers_name",
        origin_place => "origin_place",
        issuing_authority => "issuing_authority",
    }
}

field_record! {
    /// Old-format ID card, front side.
    IdOldFrontFields {
        full_name => "full_name",
        expiry_date => "expiry_date",
    }
}

field_record! {
    /// Old-format ID card, back side.
    IdOldBackFields {
        birth_name => "birth_name",
        birth_place => "birth_place",
        birth_date => "birth_date",
        sex => "sex",
        nationality => "nationality",
        mothers_name => "mothers_name",
        issuing_authority => "issuing_authority",
    }
}

field_record! {
    /// EU driving licence.
    DrivingLicenseFields {
        full_name => "full_name",
        birth_date => "birth_date",
        birth_place => "birth_place",
        issue_date => "issue_date",
        expiry_date => "expiry_date",
        issuing_authority => "issuing_authority",
    }
}

field_record! {
    /// Address card (lakcímkártya).
    AddressCardFields {
        full_name => "full_name",
        birth_place => "birth_place",
        birth_date => "birth_date",
        mothers_name => "mothers_name",
        permanent_address => "permanent_address",
        permanent_reporting_time => "permanent_reporting_time",
        temporary_address => "temporary_address",
        temporary_reporting_time => "temporary_reporting_time",
        temporary_validity => "temporary_validity",
        issuing_authority => "issuing_authority",
        issue_date => "issue_date",
    }
}

field_record! {
    /// Passport data page.
    PassportFields {
        country_code => "country_code",
        full_name => "full_name",
        birth_name => "birth_name",
        sex => "sex",
        nationality => "nationality",
        birth_date => "birth_date",
        birth_place => "birth_place",
        issue_date => "issue_date",
        expiry_date => "expiry_date",
        issuing_authority => "issuing_authority",
    }
}

field_record! {
    /// EU certificate of conformity, mapped onto registration codes.
    CocFields {
        make => "D.1",
        vehicle_type => "D.2",
        commercial_name => "D.3",
        vin => "E",
        max_laden_mass => "F.1",
        mass_in_running_order => "G",
        category => "J",
        engine_capacity => "P.1",
        max_net_power => "P.2",
        fuel => "P.3",
        colour => "R",
        seats => "S.1",
    }
}

field_record! {
    /// Unified personal payload.
    PersonalData {
        full_name => "full_name",
        birth_date => "birth_date",
        birth_place => "birth_place",
        birth_name => "birth_name",
        sex => "sex",
        nationality => "nationality",
        issuing_authority => "issuing_authority",
        issue_date => "issue_date",
        expiry_date => "expiry_date",
        mothers_name => "mothers_name",
        permanent_address => "permanent_address",
        permanent_reporting_time => "permanent_reporting_time",
        temporary_address => "temporary_address",
        temporary_reporting_time => "temporary_reporting_time",
        temporary_validity => "temporary_validity",
        country_code => "country_code",
        origin_place => "origin_place",
    }
}

field_record! {
    /// Unified vehicle payload, keyed by registration certificate codes.
    VehicleData {
        plate => "A",
        first_registration => "B",
        make => "D.1",
        vehicle_type => "D.2",
        commercial_name => "D.3",
        vin => "E",
        max_laden_mass => "F.1",
        mass_in_running_order => "G",
        validity => "H",
        registration_date => "I",
        category => "J",
        type_approval => "K",
        towable_mass => "O",
        engine_capacity => "P.1",
        max_net_power => "P.2",
        fuel => "P.3",
        engine_code => "P.5",
        power_weight_ratio => "Q",
        colour => "R",
        seats => "S.1",
        standing_places => "S.2",
        environmental_class => "V.9",
        manufacture_year => "manufacture_year",
        gearbox_type => "gearbox_type",
    }
}

/// The registration certificate carries exactly the vehicle payload codes.
pub type RegistrationFields = VehicleData;

/// Field record of one document kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DocumentFields {
    IdFront(IdFrontFields),
    IdBack(IdBackFields),
    IdOldFront(IdOldFrontFields),
    IdOldBack(IdOldBackFields),
    DrivingLicense(DrivingLicenseFields),
    AddressCard(AddressCardFields),
    Passport(PassportFields),
    Registration(RegistrationFields),
    Coc(CocFields),
}

macro_rules! each_record {
    ($self:expr, $rec:ident => $body:expr) => {
        match $self {
            DocumentFields::IdFront($rec) => $body,
            DocumentFields::IdBack($rec) => $body,
            DocumentFields::IdOldFront($rec) => $body,
            DocumentFields::IdOldBack($rec) => $body,
            DocumentFields::DrivingLicense($rec) => $body,
            DocumentFields::AddressCard($rec) => $body,
            DocumentFields::Passport($rec) => $body,
            DocumentFields::Registration($rec) => $body,
            DocumentFields::Coc($rec) => $body,
        }
    };
}

impl DocumentFields {
    pub fn entries(&self) -> Vec<(&'static str, Option<&str>)> {
        each_record!(self, rec => rec.entries())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        each_record!(self, rec => rec.get(key))
    }

    pub fn for_each_mut(&mut self, f: impl FnMut(&'static str, &mut Option<String>)) {
        each_record!(self, rec => rec.for_each_mut(f))
    }

    /// Names of the fields that hold a value.
    pub fn populated(&self) -> Vec<&'static str> {
        self.entries()
            .into_iter()
            .filter_map(|(key, value)| value.map(|_| key))
            .collect()
    }

    /// Names of the fields left unresolved.
    pub fn missing(&self) -> Vec<&'static str> {
        self.entries()
            .into_iter()
            .filter_map(|(key, value)| value.is_none().then_some(key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_serializes_every_key() {
        let rec = IdOldFrontFields {
            full_name: Some("KOVÁCS JÁNOS".into()),
            expiry_date: None,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"full_name": "KOVÁCS JÁNOS", "expiry_date": null})
        );
    }

    #[test]
    fn test_vehicle_wire_names() {
        assert_eq!(VehicleData::FIELDS.len(), 24);
        assert_eq!(VehicleData::FIELDS[2], "D.1");
        let mut data = VehicleData::default();
        assert!(data.set("V.9", Some("EURO 6".into())));
        assert!(!data.set("brith_name", Some("x".into())));
        assert_eq!(data.environmental_class.as_deref(), Some("EURO 6"));
        assert_eq!(data.get("V.9"), Some("EURO 6"));
    }

    #[test]
    fn test_personal_keys() {
        assert_eq!(PersonalData::FIELDS.len(), 17);
        assert!(PersonalData::FIELDS.contains(&"origin_place"));
    }

    #[test]
    fn test_from_entries_drops_unknown() {
        let data = PersonalData::from_entries([
            ("full_name", Some("A B")),
            ("document_number", Some("123456AB")),
        ]);
        assert_eq!(data.full_name.as_deref(), Some("A B"));
        assert_eq!(data.entries().len(), PersonalData::FIELDS.len());
    }

    #[test]
    fn test_document_fields_missing() {
        let fields = DocumentFields::IdOldFront(IdOldFrontFields {
            full_name: Some("X".into()),
            expiry_date: None,
        });
        assert_eq!(fields.populated(), vec!["full_name"]);
        assert_eq!(fields.missing(), vec!["expiry_date"]);
    }
}
