//! Canonicalization of rule-set output.
//!
//! Rule sets are tolerant and return what the text says. This pass turns
//! those candidates into strict canonical values, repairing OCR character
//! confusions with fixed substitution tables, and drops any value that
//! still fails its shape check afterwards. Every canonicalizer is
//! idempotent.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::documents::address_card::DOCNO_VALUE as ADDRESS_DOCNO_VALUE;
use crate::documents::registration::{DOCUMENT_NUMBER_VALUE, VIN_VALUE};
use crate::documents::RawExtraction;
use crate::models::fields::AddressCardFields;
use crate::models::DocumentFields;
use crate::text::{normalize_id_number, normalize_sex, normalize_whitespace};

lazy_static! {
    static ref ADDRESS_DOCNO_CANON: Regex = Regex::new(r"^\d{6} [A-Z]{2}$").unwrap();
    static ref REGISTRATION_DOCNO_CANON: Regex = Regex::new(r"^[A-Z]{2}\d{5}$").unwrap();
    static ref FOREIGN_ADDRESS: Regex =
        Regex::new(r"(?i)^\s*K[ÜU]LF[ÖO]LDI\s+C[ÍI]M\s*$").unwrap();
    static ref HOME_COUNTRY: Regex = Regex::new(r"(?i)\bMAGYARORSZ[AÁ]G\b").unwrap();
}

/// Fields holding ISO dates after extraction.
const DATE_FIELDS: &[&str] = &[
    "birth_date",
    "issue_date",
    "expiry_date",
    "permanent_reporting_time",
    "temporary_reporting_time",
    "temporary_validity",
    "B",
    "I",
];

/// Fields reported in upper case.
const UPPERCASE_FIELDS: &[&str] = &["nationality", "country_code"];

/// Canonicalized rule-set output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalized {
    pub document_number: Option<String>,
    pub fields: DocumentFields,
    /// Values dropped by a shape check or a cross-field rule.
    pub rejections: Vec<String>,
}

/// Whitespace-collapsed value, `None` when nothing is left.
pub fn empty_to_none(value: Option<&str>) -> Option<String> {
    let value = normalize_whitespace(value?);
    if value.is_empty() { None } else { Some(value) }
}

/// A real calendar date in `YYYY-MM-DD` form.
pub fn canonical_date(raw: &str) -> Option<String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Address card number as `dddddd XX`.
///
/// Digit zone: `O` to `0`, `I/J/L` to `1`. Letter zone: `0` to `O`, `1` to `I`.
pub fn canonical_address_card_number(raw: &str) -> Option<String> {
    let s = normalize_whitespace(raw);
    let caps = ADDRESS_DOCNO_VALUE.captures(&s)?;
    let digits: String = caps[1]
        .to_uppercase()
        .chars()
        .map(|c| match c {
            'O' => '0',
            'I' | 'J' | 'L' => '1',
            other => other,
        })
        .collect();
    let letters: String = caps[2]
        .to_uppercase()
        .chars()
        .map(|c| match c {
            '0' => 'O',
            '1' => 'I',
            other => other,
        })
        .collect();
    let candidate = format!("{digits} {letters}");
    ADDRESS_DOCNO_CANON.is_match(&candidate).then_some(candidate)
}

/// Registration certificate number as `XXddddd`.
///
/// Prefix: `0` to `O`, `1` to `I`. Digits: `O` to `0`, `I/J` to `1`.
pub fn canonical_registration_number(raw: &str) -> Option<String> {
    let s = normalize_whitespace(raw);
    let caps = DOCUMENT_NUMBER_VALUE.captures(&s)?;
    let prefix: String = caps[1]
        .to_uppercase()
        .chars()
        .map(|c| match c {
            '0' => 'O',
            '1' => 'I',
            other => other,
        })
        .collect();
    let digits: String = caps[2]
        .to_uppercase()
        .chars()
        .map(|c| match c {
            'O' => '0',
            'I' | 'J' => '1',
            other => other,
        })
        .collect();
    let candidate = format!("{prefix}{digits}");
    REGISTRATION_DOCNO_CANON.is_match(&candidate).then_some(candidate)
}

/// 17-character VIN with the letters `I`, `O` and `Q` read as digits.
pub fn canonical_vin(raw: &str) -> Option<String> {
    let s = normalize_whitespace(raw);
    let caps = VIN_VALUE.captures(&s)?;
    let vin: String = caps[1]
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c.to_ascii_uppercase() {
            'I' => '1',
            'O' | 'Q' => '0',
            other => other,
        })
        .collect();
    let valid = vin.len() == 17
        && vin.chars().all(|c| c.is_ascii_alphanumeric())
        && !vin.contains(['I', 'O', 'Q']);
    valid.then_some(vin)
}

/// Canonicalize one rule-set output.
pub fn postprocess(raw: RawExtraction) -> Canonicalized {
    let RawExtraction {
        document_number,
        mut fields,
    } = raw;
    let mut rejections = Vec::new();

    fields.for_each_mut(|key, value| {
        let before = empty_to_none(value.as_deref());
        let after = match before.as_deref() {
            None => None,
            Some(v) if DATE_FIELDS.contains(&key) => canonical_date(v),
            Some(v) if key == "sex" => normalize_sex(v).map(str::to_string),
            Some(v) if UPPERCASE_FIELDS.contains(&key) => Some(v.to_uppercase()),
            Some(v) if key == "E" => canonical_vin(v),
            Some(v) => Some(v.to_string()),
        };
        if let (Some(v), None) = (&before, &after) {
            debug!(field = key, value = %v, "value rejected");
            rejections.push(format!("{key}: rejected {v:?}"));
        }
        *value = after;
    });

    let document_number = empty_to_none(document_number.as_deref()).and_then(|number| {
        let canonical = match &fields {
            DocumentFields::IdFront(_) | DocumentFields::IdOldFront(_) | DocumentFields::IdBack(_) => {
                normalize_id_number(&number)
            }
            DocumentFields::AddressCard(_) => canonical_address_card_number(&number),
            DocumentFields::Registration(_) => canonical_registration_number(&number),
            DocumentFields::Coc(_) => None,
            _ => Some(number.to_uppercase()),
        };
        if canonical.is_none() {
            debug!(value = %number, "document number rejected");
            rejections.push(format!("document_number: rejected {number:?}"));
        }
        canonical
    });

    if let DocumentFields::AddressCard(record) = &mut fields {
        apply_address_card_rules(record, &mut rejections);
    }

    Canonicalized {
        document_number,
        fields,
        rejections,
    }
}

/// Cross-field rules of the address card.
fn apply_address_card_rules(record: &mut AddressCardFields, rejections: &mut Vec<String>) {
    let foreign = record
        .permanent_address
        .as_deref()
        .is_some_and(|address| FOREIGN_ADDRESS.is_match(address));

    if foreign {
        if record.permanent_reporting_time.take().is_some() {
            rejections.push("permanent_reporting_time: cleared for a foreign address".to_string());
        }
        if record
            .birth_place
            .as_deref()
            .is_some_and(|place| HOME_COUNTRY.is_match(place))
        {
            record.birth_place = None;
            rejections.push("birth_place: cleared for a foreign address".to_string());
        }
    }

    if record.temporary_address.is_some() {
        if let (Some(reported), Some(valid)) =
            (&record.temporary_reporting_time, &record.temporary_validity)
        {
            // ISO dates order lexicographically
            if reported >= valid {
                record.temporary_reporting_time = None;
                record.temporary_validity = None;
                rejections.push(
                    "temporary_reporting_time, temporary_validity: reporting time not before validity"
                        .to_string(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fields::{IdFrontFields, RegistrationFields};
    use pretty_assertions::assert_eq;

    fn address(record: AddressCardFields, number: Option<&str>) -> Canonicalized {
        postprocess(RawExtraction {
            document_number: number.map(str::to_string),
            fields: DocumentFields::AddressCard(record),
        })
    }

    #[test]
    fn test_empty_values_become_none() {
        assert_eq!(empty_to_none(Some("   ")), None);
        assert_eq!(empty_to_none(Some(" a \n b ")), Some("a b".to_string()));
        assert_eq!(empty_to_none(None), None);
    }

    #[test]
    fn test_canonical_date() {
        assert_eq!(canonical_date("1979-06-30"), Some("1979-06-30".to_string()));
        assert_eq!(canonical_date("2020-02-31"), None);
        assert_eq!(canonical_date("30.06.1979"), None);
    }

    #[test]
    fn test_address_card_number() {
        assert_eq!(
            canonical_address_card_number("I2345O A1").as_deref(),
            Some("123450 AI")
        );
        assert_eq!(canonical_address_card_number("123456AB").as_deref(), Some("123456 AB"));
        assert_eq!(canonical_address_card_number("12345 AB"), None);
    }

    #[test]
    fn test_registration_number() {
        assert_eq!(canonical_registration_number("0B1234O").as_deref(), Some("OB12340"));
        assert_eq!(canonical_registration_number("1AI2345").as_deref(), Some("IA12345"));
        assert_eq!(canonical_registration_number("AB1234"), None);
    }

    #[test]
    fn test_vin() {
        assert_eq!(
            canonical_vin("WVWZZZ1KZ6WOOOOO1").as_deref(),
            Some("WVWZZZ1KZ6W000001")
        );
        assert_eq!(
            canonical_vin("vin: wvwzzz1kz6w00000q").as_deref(),
            Some("WVWZZZ1KZ6W000000")
        );
        assert_eq!(canonical_vin("WVWZZZ1KZ6W00001"), None);
        assert_eq!(canonical_vin("WVWZZZ1KZ6W0000011"), None);
    }

    #[test]
    fn test_canonicalizers_are_idempotent() {
        let cases: [(fn(&str) -> Option<String>, &str); 5] = [
            (canonical_address_card_number, "I2345O A1"),
            (canonical_registration_number, "0B1234O"),
            (canonical_vin, "WVWZZZ1KZ6WOOOOO1"),
            (canonical_date, "2021-03-04"),
            (normalize_id_number, "I2345OAB"),
        ];
        for (canonicalize, input) in cases {
            let once = canonicalize(input).unwrap();
            assert_eq!(canonicalize(&once), Some(once.clone()), "{input}");
        }
        let sex = normalize_sex("no").unwrap();
        assert_eq!(normalize_sex(sex), Some(sex));
    }

    #[test]
    fn test_foreign_address_clears_reporting_time() {
        let record = AddressCardFields {
            permanent_address: Some("Külföldi cím".to_string()),
            permanent_reporting_time: Some("2010-01-02".to_string()),
            birth_place: Some("MAGYARORSZÁG".to_string()),
            ..AddressCardFields::default()
        };
        let out = address(record, None);
        let DocumentFields::AddressCard(record) = out.fields else {
            panic!("wrong record kind");
        };
        assert_eq!(record.permanent_reporting_time, None);
        assert_eq!(record.birth_place, None);
        assert_eq!(out.rejections.len(), 2);
    }

    #[test]
    fn test_temporary_dates_must_be_ordered() {
        let record = AddressCardFields {
            temporary_address: Some("6720 SZEGED".to_string()),
            temporary_reporting_time: Some("2025-03-04".to_string()),
            temporary_validity: Some("2020-03-04".to_string()),
            ..AddressCardFields::default()
        };
        let out = address(record, Some("123456 AB"));
        assert_eq!(out.document_number.as_deref(), Some("123456 AB"));
        assert_eq!(out.fields.get("temporary_reporting_time"), None);
        assert_eq!(out.fields.get("temporary_validity"), None);

        let record = AddressCardFields {
            temporary_address: Some("6720 SZEGED".to_string()),
            temporary_reporting_time: Some("2020-03-04".to_string()),
            temporary_validity: Some("2025-03-04".to_string()),
            ..AddressCardFields::default()
        };
        let out = address(record, None);
        assert_eq!(out.fields.get("temporary_validity"), Some("2025-03-04"));
        assert!(out.rejections.is_empty());
    }

    #[test]
    fn test_record_fields_are_canonicalized() {
        let out = postprocess(RawExtraction {
            document_number: Some("I2345OAB".to_string()),
            fields: DocumentFields::IdFront(IdFrontFields {
                full_name: Some("  KOVÁCS   JÁNOS ".to_string()),
                sex: Some("F/M".to_string()),
                nationality: Some("hun".to_string()),
                birth_date: Some("not a date".to_string()),
                expiry_date: Some(" ".to_string()),
            }),
        });
        assert_eq!(out.document_number.as_deref(), Some("123450AB"));
        assert_eq!(out.fields.get("full_name"), Some("KOVÁCS JÁNOS"));
        assert_eq!(out.fields.get("sex"), Some("FÉRFI"));
        assert_eq!(out.fields.get("nationality"), Some("HUN"));
        assert_eq!(out.fields.get("birth_date"), None);
        assert_eq!(out.fields.get("expiry_date"), None);
        assert_eq!(out.rejections, vec!["birth_date: rejected \"not a date\"".to_string()]);
    }

    #[test]
    fn test_registration_number_rejected() {
        let out = postprocess(RawExtraction {
            document_number: Some("A1".to_string()),
            fields: DocumentFields::Registration(RegistrationFields {
                vin: Some("WVWZZZ1KZ6W000001".to_string()),
                ..RegistrationFields::default()
            }),
        });
        assert_eq!(out.document_number, None);
        assert_eq!(out.fields.get("E"), Some("WVWZZZ1KZ6W000001"));
        assert_eq!(out.rejections.len(), 1);
    }
}
