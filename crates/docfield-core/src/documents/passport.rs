//! Passport data page.
//!
//! Bilingual header rows (`CSALÁDI NÉV / SURNAME`) put the value on the next
//! line; `Label: value` is only trusted when the label line has no slash.
//! Dates are assigned by position, never by label. When the name labels are
//! missing entirely, names are read by their order below the type/country
//! line.

use lazy_static::lazy_static;
use regex::Regex;

use super::Extracted;
use crate::models::fields::PassportFields;
use crate::rules::{parse_dates_iso, strip_dates};
use crate::text::scanner::{find_first_label, find_label_idx, next_non_empty, value_after_colon};
use crate::text::{normalize_ocr_line, normalize_sex, LabelPattern, NormalizedText, StopLabels};

lazy_static! {
    static ref COUNTRY_CODE_LABEL: LabelPattern = LabelPattern::new(r"(?i)\b(?:K[OÓ]D|CODE)\b").unwrap();
    static ref DOCUMENT_NUMBER_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:[ÚU]TLEV[ÉE]LSZ[ÁA]M|PASSPORT\s*(?:NO|NUMBER))\b"
    ).unwrap();
    static ref SURNAME_LABEL: LabelPattern = LabelPattern::new(r"(?i)\b(?:CSAL[AÁ]DI\s+N[EÉ]V|SURNAME)\b").unwrap();
    static ref GIVEN_NAMES_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:UT[OÓ]N[EÉ]V(?:-?EK)?|GIVEN\s+NAMES?)\b"
    ).unwrap();
    static ref BIRTH_NAME_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:SZ[ÜU]LET[ÉE]SI\s+N[EÉ]V|BIRTH\s+NAME)\b"
    ).unwrap();
    static ref SEX_LABEL: LabelPattern = LabelPattern::new(r"(?i)\b(?:NEM|SEX)\b").unwrap();
    static ref BIRTH_DATE_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:SZ[ÜU]LET[ÉE]SI\s+ID[ŐO]|DATE\s+OF\s+BIRTH)\b"
    ).unwrap();
    static ref BIRTH_PLACE_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:SZ[ÜU]LET[ÉE]SI\s+HELY|PLACE\s+OF\s+BIRTH)\b"
    ).unwrap();
    static ref NATIONALITY_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:[ÁA]LLAMPOLG[ÁA]RS[ÁA]G|NATIONALITY)\b"
    ).unwrap();
    static ref ISSUE_DATE_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:KI[AÁ]LL[IÍ]T[ÁA]SI\s+D[ÁA]TUM|DATE\s+OF\s+ISSUE)\b"
    ).unwrap();
    static ref EXPIRY_DATE_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:[ÉE]RV[ÉE]NYESS[ÉE]GI\s+ID[ŐO]|DATE\s+OF\s+EXPIRY)\b"
    ).unwrap();
    static ref AUTHORITY_LABEL: LabelPattern = LabelPattern::new(
        r"(?i)\b(?:KI[AÁ]LL[IÍ]T[OÓ]\s+HAT[OÓ]S[AÁ]G|AUTHORITY)\b"
    ).unwrap();

    static ref STOPS: StopLabels<'static> = StopLabels::new(vec![
        &*COUNTRY_CODE_LABEL,
        &*DOCUMENT_NUMBER_LABEL,
        &*SURNAME_LABEL,
        &*GIVEN_NAMES_LABEL,
        &*BIRTH_NAME_LABEL,
        &*SEX_LABEL,
        &*BIRTH_DATE_LABEL,
        &*BIRTH_PLACE_LABEL,
        &*NATIONALITY_LABEL,
        &*ISSUE_DATE_LABEL,
        &*EXPIRY_DATE_LABEL,
        &*AUTHORITY_LABEL,
    ]);

    static ref COUNTRY_CODE_VALUE: Regex = Regex::new(r"\b[A-Z]{3}\b").unwrap();
    static ref DOCUMENT_NUMBER_TOKEN: Regex = Regex::new(r"(?i)\b[A-Z0-9]{5,12}\b").unwrap();
    static ref SEX_RAW_VALUE: Regex = Regex::new(
        r"(?i)\b(?:N/F|F/M|[MF]|N[ÓŐO]|NŐ|F[ÉE]RFI|FERFI)\b"
    ).unwrap();
}

/// Lines scanned for the first country code.
const COUNTRY_SCAN_LINES: usize = 30;
/// Lines searched for the type/country line.
const TYPE_LINE_SCAN_LINES: usize = 40;
/// Lines read below the type line by the order-based fallback.
const ORDER_SCAN_LINES: usize = 30;

const SEX_WORDS: &[&str] = &["N/F", "F/M", "F", "M", "NO", "NŐ", "NÓ", "FERFI", "FÉRFI"];

/// Reduces a raw candidate to the field's value shape.
type Shape = fn(&str) -> Option<String>;

fn plain(s: &str) -> Option<String> {
    let v = normalize_ocr_line(s);
    if v.is_empty() { None } else { Some(v) }
}

fn country_code(s: &str) -> Option<String> {
    COUNTRY_CODE_VALUE.find(s).and_then(|m| plain(m.as_str()))
}

/// 5-12 alphanumerics with a digit at or after the token.
fn document_number(s: &str) -> Option<String> {
    DOCUMENT_NUMBER_TOKEN
        .find_iter(s)
        .find(|m| s[m.start()..].chars().any(|c| c.is_ascii_digit()))
        .and_then(|m| plain(m.as_str()))
}

fn sex_marker(s: &str) -> Option<String> {
    SEX_RAW_VALUE.find(s).and_then(|m| plain(m.as_str()))
}

fn letters_only(s: &str) -> bool {
    let compact: String = s.chars().filter(|c| *c != ' ').collect();
    super::is_alpha(&compact)
}

/// Same-line `Label: value` unless the label line is a `HU / EN` header,
/// else the next non-label line.
fn label_value(lines: &[String], label: &LabelPattern, shape: Shape) -> Option<String> {
    let (idx, m) = find_first_label(lines, label, 0)?;
    let label_line = &lines[idx];

    if !label_line.contains('/') {
        if let Some(v) = value_after_colon(label_line, m.end).and_then(|same| shape(&same)) {
            return Some(v);
        }
    }

    next_non_empty(lines, idx)
        .filter(|next| !STOPS.matches(next))
        .and_then(shape)
}

/// Names and nationality read by position below the type line.
#[derive(Debug, Default)]
struct OrderedNames {
    surname: Option<String>,
    given: Option<String>,
    birth_name: Option<String>,
    nationality: Option<String>,
}

fn is_hungarian_nationality(line: &str) -> bool {
    let upper = line.to_uppercase();
    line.contains('/') && (upper.contains("HUNGARIAN") || upper.starts_with("MAGYAR/"))
}

fn type_line_idx(lines: &[String]) -> usize {
    lines
        .iter()
        .take(TYPE_LINE_SCAN_LINES)
        .position(|line| COUNTRY_CODE_VALUE.is_match(line))
        .unwrap_or(0)
}

fn names_by_order(lines: &[String]) -> OrderedNames {
    let mut out = OrderedNames::default();
    let start = type_line_idx(lines);
    for line in lines.iter().skip(start).take(ORDER_SCAN_LINES) {
        if out.nationality.is_none() && is_hungarian_nationality(line) {
            out.nationality = plain(line.trim_start_matches('#'));
            continue;
        }
        if !letters_only(line) {
            continue;
        }
        if out.surname.is_none() {
            if !line.contains(' ') {
                out.surname = Some(line.clone());
            }
        } else if out.given.is_none() {
            out.given = Some(line.clone());
        } else if out.birth_name.is_none() && !line.contains('/') {
            out.birth_name = Some(line.clone());
        }
    }
    out
}

/// First line carrying a sex marker; the rest of that line is the birth place.
fn sex_and_place_by_value(lines: &[String]) -> (Option<&'static str>, Option<String>) {
    for line in lines {
        let Some(m) = SEX_RAW_VALUE.find(line) else {
            continue;
        };
        let sex = normalize_sex(m.as_str());
        let rest = format!("{} {}", &line[..m.start()], &line[m.end()..]);
        return (sex, plain(&rest));
    }
    (None, None)
}

/// Ascending dates: `(min, second, max)`.
fn dates_by_position(raw: &str) -> (Option<String>, Option<String>, Option<String>) {
    let dates = parse_dates_iso(raw);
    match dates.as_slice() {
        [] => (None, None, None),
        [only] => (Some(only.clone()), None, Some(only.clone())),
        [first, second] => (Some(first.clone()), Some(second.clone()), Some(second.clone())),
        [first, second, .., last] => (Some(first.clone()), Some(second.clone()), Some(last.clone())),
    }
}

fn birth_place(lines: &[String]) -> Option<String> {
    let Some(v) = label_value(lines, &BIRTH_PLACE_LABEL, plain) else {
        return sex_and_place_by_value(lines).1;
    };
    let stripped = strip_dates(&v);
    let mut parts = stripped.split_whitespace().peekable();
    if parts
        .peek()
        .is_some_and(|first| SEX_WORDS.contains(&first.to_uppercase().as_str()))
    {
        parts.next();
    }
    plain(&parts.collect::<Vec<_>>().join(" "))
}

fn nationality(lines: &[String], ordered: &OrderedNames) -> Option<String> {
    let labeled = label_value(lines, &NATIONALITY_LABEL, plain);
    if let Some(v) = &labeled {
        if v.contains('/') || v.to_uppercase().contains("HUNGARIAN") {
            return labeled;
        }
    }
    lines
        .iter()
        .filter_map(|line| plain(line.trim_start_matches('#')))
        .find(|line| is_hungarian_nationality(line))
        .or_else(|| ordered.nationality.clone())
        .or_else(|| labeled.filter(|v| v.contains('/')))
}

pub fn extract(text: &NormalizedText<'_>) -> Extracted<PassportFields> {
    let lines = text.lines();
    let ordered = names_by_order(lines);

    let surname = label_value(lines, &SURNAME_LABEL, plain).or_else(|| ordered.surname.clone());
    let given = label_value(lines, &GIVEN_NAMES_LABEL, plain).or_else(|| ordered.given.clone());
    let full_name = match (surname, given) {
        (Some(s), Some(g)) => plain(&format!("{s} {g}")),
        (s, g) => s.or(g),
    };

    let birth_name = label_value(lines, &BIRTH_NAME_LABEL, plain).or_else(|| {
        let names_labeled = find_label_idx(lines, &SURNAME_LABEL, 0).is_some()
            || find_label_idx(lines, &GIVEN_NAMES_LABEL, 0).is_some();
        if names_labeled { None } else { ordered.birth_name.clone() }
    });

    let sex = match label_value(lines, &SEX_LABEL, sex_marker) {
        Some(raw) => normalize_sex(&raw),
        None => sex_and_place_by_value(lines).0,
    };

    let (birth_date, issue_date, expiry_date) = dates_by_position(text.raw());

    Extracted {
        document_number: label_value(lines, &DOCUMENT_NUMBER_LABEL, document_number).or_else(|| {
            lines
                .iter()
                .filter(|line| !line.contains("<<") && !line.starts_with("P<"))
                .find(|line| {
                    DOCUMENT_NUMBER_TOKEN
                        .find(line)
                        .is_some_and(|m| m.as_str().len() == line.len())
                        && line.chars().any(|c| c.is_ascii_digit())
                })
                .cloned()
        }),
        fields: PassportFields {
            country_code: label_value(lines, &COUNTRY_CODE_LABEL, country_code).or_else(|| {
                lines
                    .iter()
                    .take(COUNTRY_SCAN_LINES)
                    .find_map(|line| country_code(line))
            }),
            full_name,
            birth_name,
            sex: sex.map(str::to_string),
            nationality: nationality(lines, &ordered),
            birth_date,
            birth_place: birth_place(lines),
            issue_date,
            expiry_date,
            issuing_authority: label_value(lines, &AUTHORITY_LABEL, plain),
        },
    }
}
