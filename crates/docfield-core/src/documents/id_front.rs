//! New-format ID card, front side.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::{first_token, is_alpha, Extracted};
use crate::models::fields::IdFrontFields;
use crate::rules::{ddmmyy_from_iso, parse_dates_iso};
use crate::text::scanner::{inline_value, inline_values, nextline_value};
use crate::text::{
    normalize_id_number, normalize_sex, normalize_whitespace, LabelPattern, NormalizedText,
};

lazy_static! {
    static ref NAME_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:family\s+name\s+and\s+given\s+name|csal[aá]di\s+[ée]s\s+ut[oó]n[eé]v)\b"
    ).unwrap();

    static ref SEX_INLINE: Regex = Regex::new(
        r"(?i)\b(?:SEX|NEM)\b(?:\s*[:.]\s*|\s+)(?P<value>.+?)\s*$"
    ).unwrap();

    static ref SEX_TOKEN: Regex = Regex::new(
        r"(?i)\b(?:N/F|F/M|NŐ|NO|N|FÉRFI|FERFI|F|M)\b"
    ).unwrap();

    /// The bilingual label may be echoed (`ÁLLAMPOLGÁRSÁG / NATIONALITY: HUN`).
    static ref NATIONALITY_INLINE: Regex = Regex::new(
        r"(?i)\b(?:NATIONALITY|[AÁ]LLAMPOLG[AÁ]RS[AÁ]G)\b(?:\s*/\s*(?:NATIONALITY|[AÁ]LLAMPOLG[AÁ]RS[AÁ]G))?(?:\s*[:.]\s*|\s+)(?P<value>.+?)\s*$"
    ).unwrap();

    static ref NATIONALITY_HU: Regex = Regex::new(r"(?i)\bHU[NM]\b").unwrap();
    static ref NATIONALITY_TOKEN: Regex = Regex::new(r"\b[A-Z]{3}\b").unwrap();

    static ref DOCNO_INLINE: Regex = Regex::new(
        r"(?i)\b(?:DOC\.?\s*NO\.?|DOC\s*NO|[OÖ]KM[AÁ]NYAZONOS[IÍ]T[OÓ])\b(?:\s*/\s*(?:DOC\.?\s*NO\.?|DOC\s*NO))?(?:\s*[:.]\s*|\s+)(?P<value>.+?)\s*$"
    ).unwrap();

    static ref ID_NUMBER_CANDIDATE: Regex = Regex::new(
        r"(?i)\b([0-9OIL|]{6}[A-Z01IL|]{2})\b"
    ).unwrap();
}

pub fn extract(text: &NormalizedText<'_>) -> Extracted<IdFrontFields> {
    let lines = text.lines();
    let (birth_date, expiry_date) = birth_and_expiry(text.raw());
    let document_number =
        document_number(lines, text.raw(), birth_date.as_deref(), expiry_date.as_deref());

    Extracted {
        document_number,
        fields: IdFrontFields {
            full_name: nextline_value(lines, &NAME_LABEL).map(str::to_string),
            sex: sex(lines, text.raw()),
            nationality: nationality(lines, text.raw()),
            birth_date,
            expiry_date,
        },
    }
}

/// Inline `NEM / SEX` value, else the first sex marker anywhere.
fn sex(lines: &[String], raw: &str) -> Option<String> {
    if let Some(sex) = inline_values(lines, &SEX_INLINE).find_map(|v| normalize_sex(&v)) {
        return Some(sex.to_string());
    }
    SEX_TOKEN
        .find_iter(raw)
        .find_map(|m| normalize_sex(m.as_str()))
        .map(str::to_string)
}

fn nationality(lines: &[String], raw: &str) -> Option<String> {
    let inline = inline_value(lines, &NATIONALITY_INLINE)
        .and_then(|v| first_token(&v))
        .filter(|tok| is_alpha(tok));
    if let Some(tok) = inline {
        return Some(tok.to_uppercase());
    }
    NATIONALITY_HU
        .find(raw)
        .or_else(|| NATIONALITY_TOKEN.find(raw))
        .map(|m| m.as_str().to_uppercase())
}

/// Earliest date is the birth date, latest the expiry date.
fn birth_and_expiry(raw: &str) -> (Option<String>, Option<String>) {
    let dates = parse_dates_iso(raw);
    match dates.as_slice() {
        [] => (None, None),
        [only] => (Some(only.clone()), None),
        [first, .., last] => (Some(first.clone()), Some(last.clone())),
    }
}

/// A number whose first six characters spell the birth or expiry date
/// (`DDMMYY`) is a misread date, not a document number.
fn is_date_derived(number: &str, birth: Option<&str>, expiry: Option<&str>) -> bool {
    let prefix = number.get(..6).unwrap_or(number);
    [birth, expiry]
        .into_iter()
        .flatten()
        .filter_map(ddmmyy_from_iso)
        .any(|ddmmyy| ddmmyy == prefix)
}

fn document_number(
    lines: &[String],
    raw: &str,
    birth: Option<&str>,
    expiry: Option<&str>,
) -> Option<String> {
    let inline = inline_value(lines, &DOCNO_INLINE)
        .and_then(|v| first_token(v.trim_start_matches([':', '.', ' '])))
        .and_then(|tok| normalize_id_number(&tok));
    if let Some(number) = inline {
        if !is_date_derived(&number, birth, expiry) {
            return Some(number);
        }
        debug!(%number, "inline document number looks like a date");
    }

    let compact = normalize_whitespace(raw);
    ID_NUMBER_CANDIDATE
        .captures_iter(&compact)
        .filter_map(|caps| caps.get(1).and_then(|m| normalize_id_number(m.as_str())))
        .find(|number| !is_date_derived(number, birth, expiry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CARD: &str = "\
MAGYARORSZÁG / HUNGARY
SZEMÉLYAZONOSÍTÓ IGAZOLVÁNY / IDENTITY CARD
CSALÁDI ÉS UTÓNÉV / FAMILY NAME AND GIVEN NAME
KOVÁCS JÁNOS
NEM / SEX: FÉRFI/M
ÁLLAMPOLGÁRSÁG / NATIONALITY: HUN
SZÜLETÉSI IDŐ / DATE OF BIRTH: 30.06.1979
ÉRVÉNYES / DATE OF EXPIRY: 12.08.2031
OKMÁNYAZONOSÍTÓ / DOC NO: 123456AB
";

    fn run(text: &str) -> Extracted<IdFrontFields> {
        extract(&NormalizedText::new(text))
    }

    #[test]
    fn test_full_card() {
        let got = run(CARD);
        assert_eq!(got.document_number.as_deref(), Some("123456AB"));
        assert_eq!(got.fields.full_name.as_deref(), Some("KOVÁCS JÁNOS"));
        assert_eq!(got.fields.sex.as_deref(), Some("FÉRFI"));
        assert_eq!(got.fields.nationality.as_deref(), Some("HUN"));
        assert_eq!(got.fields.birth_date.as_deref(), Some("1979-06-30"));
        assert_eq!(got.fields.expiry_date.as_deref(), Some("2031-08-12"));
    }

    #[test]
    fn test_sex_header_without_value_does_not_block() {
        let got = run("NEM / SEX\nNŐ / F\n");
        assert_eq!(got.fields.sex.as_deref(), Some("NŐ"));
    }

    #[test]
    fn test_single_date_is_birth_only() {
        let got = run("born 1979.06.30");
        assert_eq!(got.fields.birth_date.as_deref(), Some("1979-06-30"));
        assert_eq!(got.fields.expiry_date, None);
    }

    #[test]
    fn test_date_derived_number_rejected() {
        let text = "DATE OF BIRTH 30.06.1979\nDOC NO: 300679AB\nsomething 654321CD";
        let got = run(text);
        assert_eq!(got.document_number.as_deref(), Some("654321CD"));
    }

    #[test]
    fn test_ocr_confusions_in_number() {
        let got = run("DOC. NO.: I2345OAB");
        assert_eq!(got.document_number.as_deref(), Some("123450AB"));
    }

    #[test]
    fn test_nationality_fallback_prefers_hun() {
        let got = run("ABC xyz\nHUN");
        assert_eq!(got.fields.nationality.as_deref(), Some("HUN"));
        let got = run("something ROU");
        assert_eq!(got.fields.nationality.as_deref(), Some("ROU"));
    }

    #[test]
    fn test_missing_everything() {
        let got = run("lorem ipsum");
        assert_eq!(got.document_number, None);
        assert_eq!(got.fields.full_name, None);
        assert_eq!(got.fields.birth_date, None);
    }
}
