//! New-format ID card, back side.
//!
//! Labelled values sit on the line below their label. Name, birth date and
//! document number come from the TD1 machine-readable zone.

use lazy_static::lazy_static;
use regex::Regex;

use super::{Extracted, RuleOptions};
use crate::models::fields::IdBackFields;
use crate::rules::MrzExtractor;
use crate::text::scanner::{inline_values, nextline_value, nextline_value_guarded};
use crate::text::{normalize_id_number, LabelPattern, NormalizedText, StopLabels};

lazy_static! {
    static ref BIRTH_PLACE_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:PLACE\s+OF\s+BIRTH|SZ[UÜ]LET[EÉ]SI\s+HELY)\b"
    ).unwrap();

    static ref BIRTH_NAME_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:FAMILY\s+NAME\s+AND\s+GIVEN\s+NAME\s+AT\s+BIRTH|SZ[UÜ]LET[EÉ]SI\s+CSAL[AÁ]DI\s+(?:[EÉ]S\s+)?UT[OÓ]N[EÉ]V)\b"
    ).unwrap();

    static ref MOTHERS_NAME_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:MOTHER'?S\s+MAIDEN\s+NAME|ANYJA\s+SZ[UÜ]LET[EÉ]SI\s+NEVE)\b"
    ).unwrap();

    static ref ORIGIN_PLACE_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:PLACE\s+OF\s+ORIGIN|SZ[AÁ]RMAZ[AÁ]SI\s+HELY)\b"
    ).unwrap();

    static ref AUTHORITY_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:ISSUING\s+AUTHORITY|KI[AÁ]LL?[IÍ]T[OÓ]\s+HAT[OÓ]S[AÁ]G)\b"
    ).unwrap();

    static ref AUTHORITY_INLINE: Regex = Regex::new(
        r"(?i)\b(?:ISSUING\s+AUTHORITY|KI[AÁ]LL?[IÍ]T[OÓ]\s+HAT[OÓ]S[AÁ]G)\b(?:\s*/\s*(?:ISSUING\s+AUTHORITY|KI[AÁ]LL?[IÍ]T[OÓ]\s+HAT[OÓ]S[AÁ]G))?(?:\s*[:.]\s*|\s+)(?P<value>.+?)\s*$"
    ).unwrap();

    static ref STOPS: StopLabels<'static> = StopLabels::new(vec![
        &*BIRTH_PLACE_LABEL,
        &*BIRTH_NAME_LABEL,
        &*MOTHERS_NAME_LABEL,
        &*ORIGIN_PLACE_LABEL,
        &*AUTHORITY_LABEL,
    ]);
}

pub fn extract(text: &NormalizedText<'_>, opts: &RuleOptions) -> Extracted<IdBackFields> {
    let lines = text.lines();
    let mrz = MrzExtractor::new().with_reference_year(opts.mrz_reference_year);
    let mrz = mrz
        .find_block(lines)
        .map(|block| mrz.decode(&block))
        .unwrap_or_default();

    let owned = |v: Option<&str>| v.map(str::to_string);

    Extracted {
        document_number: mrz.document_number.as_deref().and_then(normalize_id_number),
        fields: IdBackFields {
            full_name: mrz.full_name,
            birth_date: mrz.birth_date,
            birth_place: owned(nextline_value(lines, &BIRTH_PLACE_LABEL)),
            birth_name: owned(nextline_value_guarded(lines, &BIRTH_NAME_LABEL, &STOPS).value),
            mothers_name: owned(nextline_value(lines, &MOTHERS_NAME_LABEL)),
            origin_place: owned(nextline_value_guarded(lines, &ORIGIN_PLACE_LABEL, &STOPS).value),
            issuing_authority: issuing_authority(lines),
        },
    }
}

/// Inline `KIÁLLÍTÓ HATÓSÁG: ...`, else the line below the label.
fn issuing_authority(lines: &[String]) -> Option<String> {
    inline_values(lines, &AUTHORITY_INLINE)
        .find(|v| !STOPS.matches(v) && v.chars().any(char::is_alphanumeric))
        .or_else(|| {
            nextline_value_guarded(lines, &AUTHORITY_LABEL, &STOPS)
                .value
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CARD: &str = "\
SZÜLETÉSI HELY / PLACE OF BIRTH
BUDAPEST
SZÜLETÉSI CSALÁDI ÉS UTÓNÉV / FAMILY NAME AND GIVEN NAME AT BIRTH
KOVÁCS JÁNOS PÉTER
ANYJA SZÜLETÉSI NEVE / MOTHER'S MAIDEN NAME
NAGY MÁRIA
SZÁRMAZÁSI HELY / PLACE OF ORIGIN
KIÁLLÍTÓ HATÓSÁG / ISSUING AUTHORITY
BM NYILVÁNTARTÓ
IDHUN123456AB<8<<<<<<<<<<<<<<<
7906307F3108125HUN<<<<<<<<<<<4
KOVACS<<JANOS<PETER<<<<<<<<<<<
";

    fn run(text: &str) -> Extracted<IdBackFields> {
        let opts = RuleOptions {
            mrz_reference_year: Some(2026),
            ..RuleOptions::default()
        };
        extract(&NormalizedText::new(text), &opts)
    }

    #[test]
    fn test_full_card() {
        let got = run(CARD);
        assert_eq!(got.document_number.as_deref(), Some("123456AB"));
        assert_eq!(got.fields.full_name.as_deref(), Some("KOVACS JANOS PETER"));
        assert_eq!(got.fields.birth_date.as_deref(), Some("1979-06-30"));
        assert_eq!(got.fields.birth_place.as_deref(), Some("BUDAPEST"));
        assert_eq!(got.fields.birth_name.as_deref(), Some("KOVÁCS JÁNOS PÉTER"));
        assert_eq!(got.fields.mothers_name.as_deref(), Some("NAGY MÁRIA"));
        assert_eq!(got.fields.issuing_authority.as_deref(), Some("BM NYILVÁNTARTÓ"));
    }

    #[test]
    fn test_guard_blocks_label_line() {
        // origin place is followed directly by the authority label
        assert_eq!(run(CARD).fields.origin_place, None);
        let got = run("PLACE OF ORIGIN\nPLACE OF BIRTH\nSZEGED");
        assert_eq!(got.fields.origin_place, None);
        assert_eq!(got.fields.birth_place.as_deref(), Some("SZEGED"));
    }

    #[test]
    fn test_inline_authority() {
        let got = run("KIÁLLÍTÓ HATÓSÁG: BUDAPEST FŐVÁROS KORMÁNYHIVATALA");
        assert_eq!(
            got.fields.issuing_authority.as_deref(),
            Some("BUDAPEST FŐVÁROS KORMÁNYHIVATALA")
        );
    }

    #[test]
    fn test_bad_mrz_number_is_dropped() {
        let text = CARD.replace("IDHUN123456AB<8", "IDHUN123456AB<3");
        let got = run(&text);
        assert_eq!(got.document_number, None);
        assert_eq!(got.fields.full_name.as_deref(), Some("KOVACS JANOS PETER"));
    }
}
