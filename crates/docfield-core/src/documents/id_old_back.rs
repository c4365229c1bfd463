//! Old-format ID card, back side.
//!
//! Values are either inline (`LABEL: value`) or on the line below the
//! label; the inline form wins.

use lazy_static::lazy_static;
use regex::Regex;

use super::{first_token, Extracted};
use crate::models::fields::IdOldBackFields;
use crate::rules::{first_date, parse_dates};
use crate::text::scanner::{inline_value, nextline_value_guarded};
use crate::text::{normalize_sex, LabelPattern, NormalizedText, StopLabels};

/// A label plus its inline `label: value` form.
struct LabeledField {
    label: LabelPattern,
    inline: Regex,
}

impl LabeledField {
    fn new(label: &str) -> Self {
        Self {
            label: LabelPattern::new(&format!(r"(?i)\b(?:{label})\b")).unwrap(),
            inline: Regex::new(&format!(r"(?i)\b(?:{label})\b\s*[:.]\s*(?P<value>.+?)\s*$")).unwrap(),
        }
    }

    fn value(&self, lines: &[String]) -> Option<String> {
        inline_value(lines, &self.inline).or_else(|| {
            nextline_value_guarded(lines, &self.label, &STOPS)
                .value
                .map(str::to_string)
        })
    }
}

lazy_static! {
    static ref BIRTH_NAME: LabeledField = LabeledField::new(r"SZ[UÜ]LET[EÉ]SI\s+N[ÉE]V|BIRTH\s+NAME");
    static ref BIRTH_PLACE: LabeledField = LabeledField::new(r"SZ[UÜ]LET[EÉ]SI\s+HELY|PLACE\s+OF\s+BIRTH");
    static ref BIRTH_DATE: LabeledField = LabeledField::new(r"SZ[UÜ]LET[EÉ]SI\s+ID[ŐO]|DATE\s+OF\s+BIRTH");
    static ref MOTHERS_NAME: LabeledField = LabeledField::new(r"ANYJA\s+SZ[UÜ]LET[EÉ]SI\s+NEVE|MOTHER'?S\s+NAME");
    static ref SEX: LabeledField = LabeledField::new(r"NEME?|SEX");

    static ref STOPS: StopLabels<'static> = StopLabels::new(vec![
        &BIRTH_NAME.label,
        &BIRTH_PLACE.label,
        &BIRTH_DATE.label,
        &MOTHERS_NAME.label,
        &SEX.label,
    ]);

    static ref NATIONALITY_INLINE: Regex = Regex::new(
        r"(?i)\b(?:[AÁ]LLAMPOLG[AÁ]RS[AÁ]G|NATIONALITY)\b(?:\s*[:.]\s*|\s+)(?P<value>.+?)\s*$"
    ).unwrap();

    static ref AUTHORITY_INLINE: Regex = Regex::new(
        r"(?i)\b(?:KI[ÁA]LL[IÍ]T[ÓO]\s+HAT[ÓO]S[ÁA]G|AUTHORITY)\b(?:\s*[:.]\s*|\s+)(?P<value>.+?)\s*$"
    ).unwrap();
}

pub fn extract(text: &NormalizedText<'_>) -> Extracted<IdOldBackFields> {
    let lines = text.lines();
    Extracted {
        document_number: None,
        fields: IdOldBackFields {
            birth_name: BIRTH_NAME.value(lines),
            birth_place: BIRTH_PLACE.value(lines),
            birth_date: BIRTH_DATE.value(lines).and_then(|v| first_date(&v)),
            sex: SEX
                .value(lines)
                .and_then(|v| normalize_sex(&v))
                .map(str::to_string),
            nationality: nationality(lines),
            mothers_name: MOTHERS_NAME.value(lines),
            issuing_authority: issuing_authority(lines),
        },
    }
}

/// `MAGYAR / HUN` keeps the part after the last slash.
fn nationality(lines: &[String]) -> Option<String> {
    let raw = inline_value(lines, &NATIONALITY_INLINE)?;
    let tail = raw.rsplit('/').next().unwrap_or(&raw);
    first_token(tail).map(|tok| tok.to_uppercase())
}

/// The issue date often trails the authority; cut at its year.
fn issuing_authority(lines: &[String]) -> Option<String> {
    let raw = inline_value(lines, &AUTHORITY_INLINE)?;
    let value = match parse_dates(&raw).first() {
        Some(date) => {
            let year = date.format("%Y").to_string();
            match raw.find(&year) {
                Some(idx) => raw[..idx].trim().to_string(),
                None => raw,
            }
        }
        None => raw,
    };
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CARD: &str = "\
SZÜLETÉSI NÉV: KOVÁCS JÁNOS
SZÜLETÉSI HELY
SZEGED
SZÜLETÉSI IDŐ: 1979.06.30.
NEME: FÉRFI
ÁLLAMPOLGÁRSÁG: MAGYAR / HUN
ANYJA SZÜLETÉSI NEVE: NAGY MÁRIA
KIÁLLÍTÓ HATÓSÁG: BUDAPEST XI. KER. 2015.03.04
";

    fn run(text: &str) -> Extracted<IdOldBackFields> {
        extract(&NormalizedText::new(text))
    }

    #[test]
    fn test_full_card() {
        let got = run(CARD);
        assert_eq!(got.document_number, None);
        assert_eq!(got.fields.birth_name.as_deref(), Some("KOVÁCS JÁNOS"));
        assert_eq!(got.fields.birth_place.as_deref(), Some("SZEGED"));
        assert_eq!(got.fields.birth_date.as_deref(), Some("1979-06-30"));
        assert_eq!(got.fields.sex.as_deref(), Some("FÉRFI"));
        assert_eq!(got.fields.nationality.as_deref(), Some("HUN"));
        assert_eq!(got.fields.mothers_name.as_deref(), Some("NAGY MÁRIA"));
        assert_eq!(got.fields.issuing_authority.as_deref(), Some("BUDAPEST XI. KER."));
    }

    #[test]
    fn test_next_line_guarded_by_other_label() {
        let got = run("SZÜLETÉSI HELY\nNEME: NŐ");
        assert_eq!(got.fields.birth_place, None);
        assert_eq!(got.fields.sex.as_deref(), Some("NŐ"));
    }

    #[test]
    fn test_mothers_name_is_not_birth_name() {
        let got = run("ANYJA SZÜLETÉSI NEVE: NAGY MÁRIA");
        assert_eq!(got.fields.birth_name, None);
        assert_eq!(got.fields.mothers_name.as_deref(), Some("NAGY MÁRIA"));
    }
}
