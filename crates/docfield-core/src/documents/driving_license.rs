//! EU driving licence.
//!
//! Fields are printed behind the harmonized numeric codes (`1.` surname,
//! `2.` given names, `3.` birth date and place, `4a.`-`4c.` issue/expiry/
//! authority, `5.` licence number). OCR often merges several codes onto one
//! line, so every anchor on a line is paired with the text up to the next.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::{first_token, Extracted};
use crate::models::fields::DrivingLicenseFields;
use crate::rules::first_date;
use crate::text::{normalize_whitespace, NormalizedText};

lazy_static! {
    static ref ANCHOR: Regex = Regex::new(
        r"(?i)(?:^|\s)(?P<label>4\s*\.?\s*\(?\s*[abcd]\s*\)?|[1235])(?:\s*\.?\s*:|\s*\.)"
    ).unwrap();
}

const VALUE_TRIM: &[char] = &[' ', '.', ':', '-', '–', '—', '·', '|'];

pub fn extract(text: &NormalizedText<'_>) -> Extracted<DrivingLicenseFields> {
    let kv = collect_pairs(text.lines());
    let (birth_date, birth_place) = birth_date_and_place(kv.get("3").map(String::as_str));
    let date_of = |code: &str| kv.get(code).and_then(|v| first_date(v));

    Extracted {
        document_number: kv.get("5").and_then(|v| first_token(v)),
        fields: DrivingLicenseFields {
            full_name: match (kv.get("1"), kv.get("2")) {
                (Some(surname), Some(given)) => Some(format!("{surname} {given}")),
                _ => None,
            },
            birth_date,
            birth_place,
            issue_date: date_of("4a"),
            expiry_date: date_of("4b"),
            issuing_authority: kv.get("4c").cloned(),
        },
    }
}

/// `4(a)`, `4. a` and `4a` all become `4a`.
fn normalize_code(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '.') && !c.is_whitespace())
        .collect()
}

/// Every `(code, value)` pair on one line.
fn line_pairs(line: &str) -> Vec<(String, String)> {
    let anchors: Vec<(usize, usize, &str)> = ANCHOR
        .captures_iter(line)
        .filter_map(|caps| {
            let label = caps.name("label")?;
            let whole = caps.get(0)?;
            Some((label.start(), whole.end(), label.as_str()))
        })
        .collect();

    anchors
        .iter()
        .enumerate()
        .filter_map(|(i, &(_, value_start, label))| {
            let value_end = anchors.get(i + 1).map_or(line.len(), |next| next.0);
            let value = normalize_whitespace(line[value_start..value_end].trim_matches(VALUE_TRIM));
            if value.is_empty() {
                None
            } else {
                Some((normalize_code(label), value))
            }
        })
        .collect()
}

/// First value seen for each code across the document.
fn collect_pairs(lines: &[String]) -> HashMap<String, String> {
    let mut kv = HashMap::new();
    for line in lines {
        for (code, value) in line_pairs(line) {
            kv.entry(code).or_insert(value);
        }
    }
    kv
}

/// Field 3: `06.04.2001 MIERCUREA CIUC, RO`.
fn birth_date_and_place(raw: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(raw) = raw else {
        return (None, None);
    };
    let Some(date) = first_date(raw) else {
        return (None, Some(raw.to_string()));
    };
    let place = raw
        .split_whitespace()
        .filter(|tok| {
            let has_digit = tok.chars().any(|c| c.is_ascii_digit());
            let has_sep = tok.contains(['.', '-', '/']);
            !(has_digit && has_sep)
        })
        .collect::<Vec<_>>()
        .join(" ");
    (Some(date), if place.is_empty() { None } else { Some(place) })
}
