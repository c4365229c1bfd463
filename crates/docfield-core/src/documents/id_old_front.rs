//! Old-format ID card, front side.

use lazy_static::lazy_static;
use regex::Regex;

use super::{first_token, Extracted};
use crate::models::fields::IdOldFrontFields;
use crate::rules::parse_dates_iso;
use crate::text::scanner::{inline_value, nextline_value};
use crate::text::{normalize_id_number, normalize_whitespace, LabelPattern, NormalizedText};

lazy_static! {
    static ref NAME_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:CSAL[AÁ]DI\s+[EÉ]S\s+UT[OÓ]N[EÉ]V|SURNAME\s+AND\s+GIVEN\s+NAME)\b"
    ).unwrap();

    static ref DOCNO_INLINE: Regex = Regex::new(
        r"(?i)\b[OÖ]KM[AÁ]NYAZONOS[IÍ]T[OÓ]\b(?:\s*[:.]\s*|\s+)(?P<value>.+?)\s*$"
    ).unwrap();

    static ref ID_NUMBER_CANDIDATE: Regex = Regex::new(
        r"(?i)\b([0-9OIL|]{6}[A-Z01IL|]{2})\b"
    ).unwrap();
}

pub fn extract(text: &NormalizedText<'_>) -> Extracted<IdOldFrontFields> {
    let lines = text.lines();
    Extracted {
        document_number: document_number(lines, text.raw()),
        fields: IdOldFrontFields {
            full_name: nextline_value(lines, &NAME_LABEL).map(str::to_string),
            // the expiry date is the only date printed on the front
            expiry_date: parse_dates_iso(text.raw()).pop(),
        },
    }
}

fn document_number(lines: &[String], raw: &str) -> Option<String> {
    // `654321 CD` is split by OCR more often than not
    let inline = inline_value(lines, &DOCNO_INLINE).and_then(|v| {
        first_token(&v)
            .and_then(|tok| normalize_id_number(&tok))
            .or_else(|| normalize_id_number(&v))
    });
    if inline.is_some() {
        return inline;
    }
    let compact = normalize_whitespace(raw);
    ID_NUMBER_CANDIDATE
        .captures_iter(&compact)
        .find_map(|caps| caps.get(1).and_then(|m| normalize_id_number(m.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(text: &str) -> Extracted<IdOldFrontFields> {
        extract(&NormalizedText::new(text))
    }

    #[test]
    fn test_full_card() {
        let got = run("SZEMÉLYI IGAZOLVÁNY\nCSALÁDI ÉS UTÓNÉV\nKOVÁCS JÁNOS\nÉRVÉNYES: 2025.05.06.\nOKMÁNYAZONOSÍTÓ: 654321 CD");
        assert_eq!(got.fields.full_name.as_deref(), Some("KOVÁCS JÁNOS"));
        assert_eq!(got.fields.expiry_date.as_deref(), Some("2025-05-06"));
        assert_eq!(got.document_number.as_deref(), Some("654321CD"));
    }

    #[test]
    fn test_number_candidate_scan() {
        let got = run("random 65432lCD text");
        assert_eq!(got.document_number.as_deref(), Some("654321CD"));
    }

    #[test]
    fn test_latest_date_is_expiry() {
        let got = run("2020.01.01 2030.01.01");
        assert_eq!(got.fields.expiry_date.as_deref(), Some("2030-01-01"));
    }
}
