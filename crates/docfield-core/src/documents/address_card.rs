//! Address card (lakcímet igazoló hatósági igazolvány).
//!
//! Hungarian-only labels. Addresses wrap onto a second line, and each
//! address block carries its own reporting time, so those are searched
//! only between the block's label and the next block.

use lazy_static::lazy_static;
use regex::Regex;

use super::Extracted;
use crate::models::fields::AddressCardFields;
use crate::rules::{first_date, strip_dates};
use crate::text::scanner::{
    cut_at_next_label, find_first_label, find_label_idx, scan_forward, value_after_match,
    LabelMatch,
};
use crate::text::{normalize_whitespace, LabelPattern, NormalizedText, Recipe, StopLabels};

lazy_static! {
    static ref FULL_NAME_LABEL: LabelPattern =
        LabelPattern::new(r"(?i)\bCSAL[AÁ]DI\s+[EÉ]S\s+UT[OÓ]N[EÉ]V\b").unwrap();
    static ref BIRTH_PLACE_DATE_LABEL: LabelPattern =
        LabelPattern::new(r"(?i)\bSZ[UÜ]LET[EÉ]SI\s+HELYE?[, ]*ID(?:[ŐO]|EJE)\b").unwrap();
    static ref MOTHERS_NAME_LABEL: LabelPattern =
        LabelPattern::new(r"(?i)\bANYJA\s+NEVE\b").unwrap();
    static ref PERMANENT_ADDRESS_LABEL: LabelPattern =
        LabelPattern::new(r"(?i)\bLAK[OÓ]HELY\b").unwrap();
    static ref TEMPORARY_ADDRESS_LABEL: LabelPattern =
        LabelPattern::new(r"(?i)\bTART[OÓ]ZKOD[AÁ]SI\s+HELY\b").unwrap();
    static ref REPORTING_TIME_LABEL: LabelPattern =
        LabelPattern::new(r"(?i)\bBEJELENT[ÉE]SI\s+ID[ŐO]\b").unwrap();
    static ref VALIDITY_LABEL: LabelPattern =
        LabelPattern::new(r"(?i)\b[ÉE]RV[ÉE]NYESS[ÉE]GI\s+IDEJE\b").unwrap();
    static ref AUTHORITY_LABEL: LabelPattern =
        LabelPattern::new(r"(?i)\bKI[AÁ]LL[IÍ]T[OÓ]\s+HAT[OÓ]S[AÁ]G\b").unwrap();
    static ref TITLE_LABEL: LabelPattern =
        LabelPattern::new(r"(?i)\bLAKC[IÍ]MET\s+IGAZOL[OÓ]\b").unwrap();

    static ref STOPS: StopLabels<'static> = StopLabels::new(vec![
        &*FULL_NAME_LABEL,
        &*BIRTH_PLACE_DATE_LABEL,
        &*MOTHERS_NAME_LABEL,
        &*PERMANENT_ADDRESS_LABEL,
        &*TEMPORARY_ADDRESS_LABEL,
        &*REPORTING_TIME_LABEL,
        &*VALIDITY_LABEL,
        &*AUTHORITY_LABEL,
    ]);

    /// Six digits and two letters; OCR swaps `0/O` and `1/I/J/L` freely.
    pub(crate) static ref DOCNO_VALUE: Regex =
        Regex::new(r"(?i)\b([0-9OIJLl]{6})\s?([A-Z01]{2})\b").unwrap();
}

/// Lines searched below a label for a date.
const DATE_SCAN_LINES: usize = 6;
/// Lines searched for a birth-place continuation.
const PLACE_CONTINUATION_LINES: usize = 3;
/// Lines searched for an address continuation.
const ADDRESS_CONTINUATION_LINES: usize = 2;

fn is_stop(line: &str) -> bool {
    STOPS.matches(line)
}

fn has_date(line: &str) -> bool {
    first_date(line).is_some()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Value of the label at `(idx, m)` and the line it was read from: the
/// label line's tail, else the next non-label line.
fn value_at(lines: &[String], idx: usize, m: LabelMatch) -> Option<(String, usize)> {
    let tail = value_after_match(&lines[idx], m);
    if !tail.is_empty() {
        let cut = cut_at_next_label(&tail, &STOPS);
        let value = if cut.is_empty() { tail } else { cut };
        return Some((value, idx));
    }
    let next = idx + 1;
    match lines.get(next) {
        Some(line) if !is_stop(line) => Some((line.trim().to_string(), next)),
        _ => None,
    }
}

fn value_line(lines: &[String], label: &LabelPattern) -> Option<String> {
    let (idx, m) = find_first_label(lines, label, 0)?;
    value_at(lines, idx, m).map(|(value, _)| value)
}

/// Value plus one wrapped continuation line.
fn value_two_lines(lines: &[String], label: &LabelPattern) -> Option<String> {
    let (idx, m) = find_first_label(lines, label, 0)?;
    let (first, first_idx) = value_at(lines, idx, m)?;
    let continuation = scan_forward(
        lines,
        first_idx,
        is_stop,
        |_| false,
        |_| true,
        Some(ADDRESS_CONTINUATION_LINES),
    );
    Some(match continuation {
        Some(next) => format!("{first} {next}"),
        None => first,
    })
}

/// Date on the label line, else the first dated line below it.
fn date_near(lines: &[String], idx: usize) -> Option<String> {
    first_date(&lines[idx]).or_else(|| {
        scan_forward(lines, idx, is_stop, |_| false, has_date, Some(DATE_SCAN_LINES))
            .and_then(first_date)
    })
}

fn birth_place_and_date(lines: &[String]) -> (Option<String>, Option<String>) {
    let Some((idx, m)) = find_first_label(lines, &BIRTH_PLACE_DATE_LABEL, 0) else {
        return (None, None);
    };

    let place = value_at(lines, idx, m).and_then(|(value, place_idx)| {
        let place = non_empty(strip_dates(&value))?;
        let country = scan_forward(
            lines,
            place_idx,
            is_stop,
            |_| false,
            |_| true,
            Some(PLACE_CONTINUATION_LINES),
        )
        .map(strip_dates)
        .and_then(non_empty);
        Some(match country {
            Some(country) => normalize_whitespace(&format!("{place}, {country}")),
            None => place,
        })
    });

    (place, date_near(lines, idx))
}

/// First reporting-time label strictly between `start` and `end`.
fn reporting_time_between(
    lines: &[String],
    start: usize,
    end: usize,
) -> Option<(usize, LabelMatch)> {
    find_first_label(lines, &REPORTING_TIME_LABEL, start + 1).filter(|(idx, _)| *idx < end)
}

fn permanent_reporting_time(lines: &[String]) -> Option<String> {
    let perm_idx = find_label_idx(lines, &PERMANENT_ADDRESS_LABEL, 0)?;
    let temp_idx =
        find_label_idx(lines, &TEMPORARY_ADDRESS_LABEL, perm_idx + 1).unwrap_or(lines.len());
    let (idx, m) = reporting_time_between(lines, perm_idx, temp_idx)?;
    value_at(lines, idx, m).and_then(|(value, _)| first_date(&value))
}

fn temporary_reporting_time(lines: &[String]) -> Option<String> {
    let temp_idx = find_label_idx(lines, &TEMPORARY_ADDRESS_LABEL, 0)?;
    let end = [&*VALIDITY_LABEL, &*AUTHORITY_LABEL]
        .into_iter()
        .filter_map(|label| find_label_idx(lines, label, temp_idx + 1))
        .min()
        .unwrap_or(lines.len());
    let (idx, m) = reporting_time_between(lines, temp_idx, end)?;

    let tail = value_after_match(&lines[idx], m);
    if !tail.is_empty() {
        let cut = cut_at_next_label(&tail, &STOPS);
        let candidate = if cut.is_empty() { tail } else { cut };
        if let Some(date) = first_date(&candidate) {
            return Some(date);
        }
    }
    scan_forward(lines, idx, is_stop, |_| false, has_date, Some(DATE_SCAN_LINES))
        .and_then(first_date)
}

/// Authority name without the trailing issue date, plus that date.
fn authority_and_issue_date(lines: &[String]) -> (Option<String>, Option<String>) {
    let Some((idx, m)) = find_first_label(lines, &AUTHORITY_LABEL, 0) else {
        return (None, None);
    };
    let authority = value_at(lines, idx, m).and_then(|(value, _)| non_empty(strip_dates(&value)));
    (authority, date_near(lines, idx))
}

/// `dddddd XX` as printed, before OCR repair.
fn document_number(lines: &[String], raw: &str) -> Option<String> {
    let candidate = Recipe::new(&TITLE_LABEL, &STOPS)
        .with_value(&DOCNO_VALUE)
        .extract(lines, raw)
        .unwrap_or_else(|| normalize_whitespace(raw));
    let caps = DOCNO_VALUE.captures(&candidate)?;
    Some(format!("{} {}", &caps[1], &caps[2]).to_uppercase())
}

pub fn extract(text: &NormalizedText<'_>) -> Extracted<AddressCardFields> {
    let lines = text.lines();
    let (birth_place, birth_date) = birth_place_and_date(lines);
    let (issuing_authority, issue_date) = authority_and_issue_date(lines);

    Extracted {
        document_number: document_number(lines, text.raw()),
        fields: AddressCardFields {
            full_name: value_line(lines, &FULL_NAME_LABEL),
            birth_place,
            birth_date,
            mothers_name: value_line(lines, &MOTHERS_NAME_LABEL),
            permanent_address: value_two_lines(lines, &PERMANENT_ADDRESS_LABEL),
            permanent_reporting_time: permanent_reporting_time(lines),
            temporary_address: value_two_lines(lines, &TEMPORARY_ADDRESS_LABEL),
            temporary_reporting_time: temporary_reporting_time(lines),
            temporary_validity: value_line(lines, &VALIDITY_LABEL).and_then(|v| first_date(&v)),
            issuing_authority,
            issue_date,
        },
    }
}
