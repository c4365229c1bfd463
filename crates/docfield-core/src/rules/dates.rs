//! Date recognition for Hungarian and English document text.
//!
//! Recognized shapes, each searched independently:
//! - `DD.MM.YYYY` with `.`, `-`, `/` or space separators
//! - `YYYY.MM.DD` with the same separators
//! - `YYYY <month> DD`, month in Hungarian or English, optionally `HU/EN`
//! - `YYYY. <month> DD.` (Hungarian long form)
//! - `DD <month> YY`
//!
//! Impossible calendar dates are dropped silently.

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::{ExtractionMatch, FieldExtractor};
use crate::text::normalize_whitespace;

lazy_static! {
    static ref DATE_DDMMYYYY: Regex =
        Regex::new(r"\b(\d{1,2})\s*[.\-/ ]\s*(\d{1,2})\s*[.\-/ ]\s*(\d{4})\b\.?").unwrap();

    static ref DATE_YYYYMMDD: Regex =
        Regex::new(r"\b(\d{4})\s*[.\-/ ]\s*(\d{1,2})\s*[.\-/ ]\s*(\d{1,2})\b\.?").unwrap();

    static ref DATE_YYYY_MON_DD: Regex = Regex::new(
        r"\b(\d{4})\s+([A-Za-zÁÉÍÓÖŐÚÜŰáéíóöőúüű]{3,}(?:/[A-Za-zÁÉÍÓÖŐÚÜŰáéíóöőúüű]{3,})?)\s+(\d{2})\b"
    ).unwrap();

    static ref DATE_YYYY_HU_MON_DD: Regex = Regex::new(
        r"\b(\d{4})\s*\.?\s*([A-Za-zÁÉÍÓÖŐÚÜŰáéíóöőúüű]+)\s+(\d{1,2})\s*\.?\b"
    ).unwrap();

    static ref DATE_DD_MON_YY: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\s*[.\-/ ]\s*([A-Za-zÁÉÍÓÖŐÚÜŰáéíóöőúüű]{3,}(?:/[A-Za-zÁÉÍÓÖŐÚÜŰáéíóöőúüű]{3,})?)\s*[.\-/ ]\s*(\d{2})\b\.?"
    ).unwrap();
}

/// Position of the captures in a date pattern.
#[derive(Clone, Copy)]
enum Layout {
    DayMonthYear,
    YearMonthDay,
    YearNameDay,
    DayNameShortYear,
}

/// Date extractor over every supported shape.
///
/// `extract_all` yields unique dates in ascending order; `extract`
/// therefore returns the earliest date in the text.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    fn collect(
        pattern: &Regex,
        layout: Layout,
        text: &str,
        out: &mut Vec<ExtractionMatch<NaiveDate>>,
    ) {
        for caps in pattern.captures_iter(text) {
            let Some(date) = date_from_captures(&caps, layout) else {
                continue;
            };
            let Some(full) = caps.get(0) else { continue };
            out.push(ExtractionMatch::new(date, full.as_str()).with_position(full.start(), full.end()));
        }
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = self.extract_spans(text);
        results.sort_by_key(|m| m.value);
        results.dedup_by_key(|m| m.value);
        results
    }
}

impl DateExtractor {
    /// Every valid date occurrence in text order of discovery, duplicates kept.
    pub fn extract_spans(&self, text: &str) -> Vec<ExtractionMatch<NaiveDate>> {
        let mut results = Vec::new();
        Self::collect(&DATE_DDMMYYYY, Layout::DayMonthYear, text, &mut results);
        Self::collect(&DATE_YYYYMMDD, Layout::YearMonthDay, text, &mut results);
        Self::collect(&DATE_YYYY_MON_DD, Layout::YearNameDay, text, &mut results);
        Self::collect(&DATE_YYYY_HU_MON_DD, Layout::YearNameDay, text, &mut results);
        Self::collect(&DATE_DD_MON_YY, Layout::DayNameShortYear, text, &mut results);
        results
    }
}

fn date_from_captures(caps: &Captures<'_>, layout: Layout) -> Option<NaiveDate> {
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let (year, month, day) = match layout {
        Layout::DayMonthYear => (num(3)? as i32, num(2)?, num(1)?),
        Layout::YearMonthDay => (num(1)? as i32, num(2)?, num(3)?),
        Layout::YearNameDay => (num(1)? as i32, month_from_pair(caps.get(2)?.as_str())?, num(3)?),
        Layout::DayNameShortYear => {
            let yy = num(3)? as i32;
            let year = if yy <= 49 { 2000 + yy } else { 1900 + yy };
            (year, month_from_pair(caps.get(2)?.as_str())?, num(1)?)
        }
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Resolve a month token, trying each half of a `HU/EN` pair in turn.
fn month_from_pair(token: &str) -> Option<u32> {
    token
        .split('/')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .find_map(month_to_number)
}

/// Look up a Hungarian or English month name, long or abbreviated.
fn month_to_number(token: &str) -> Option<u32> {
    let lower = token.trim().to_lowercase();
    let name = lower.strip_suffix('.').unwrap_or(&lower);
    let month = match name {
        "jan" | "január" | "januar" | "january" => 1,
        "feb" | "február" | "februar" | "february" => 2,
        "márc" | "marc" | "mar" | "március" | "marcius" | "march" => 3,
        "ápr" | "apr" | "április" | "aprilis" | "april" => 4,
        "máj" | "maj" | "may" | "május" | "majus" => 5,
        "jún" | "jun" | "június" | "junius" | "june" => 6,
        "júl" | "jul" | "július" | "julius" | "july" => 7,
        "aug" | "augusztus" | "august" => 8,
        "szept" | "sep" | "sept" | "szeptember" | "september" => 9,
        "okt" | "oct" | "október" | "oktober" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "dez" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

/// All unique dates in `text`, ascending.
pub fn parse_dates(text: &str) -> Vec<NaiveDate> {
    DateExtractor::new()
        .extract_all(text)
        .into_iter()
        .map(|m| m.value)
        .collect()
}

/// All unique dates in `text` as ascending ISO-8601 strings.
pub fn parse_dates_iso(text: &str) -> Vec<String> {
    parse_dates(text).iter().map(|d| d.to_string()).collect()
}

/// Earliest date in `text`, ISO formatted.
pub fn first_date(text: &str) -> Option<String> {
    parse_dates(text).first().map(|d| d.to_string())
}

/// `YYYY-MM-DD` to the `DDMMYY` form printed inside document numbers.
pub fn ddmmyy_from_iso(iso: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(iso, "%Y-%m-%d").ok()?;
    Some(format!(
        "{:02}{:02}{:02}",
        date.day(),
        date.month(),
        date.year().rem_euclid(100)
    ))
}

/// Remove every recognized date occurrence from `s`.
pub fn strip_dates(s: &str) -> String {
    let mut spans: Vec<(usize, usize)> = DateExtractor::new()
        .extract_spans(s)
        .into_iter()
        .filter_map(|m| m.position)
        .collect();
    spans.sort_unstable();

    let mut out = String::with_capacity(s.len());
    let mut cursor = 0;
    for (start, end) in spans {
        if start > cursor {
            out.push_str(&s[cursor..start]);
            out.push(' ');
        }
        cursor = cursor.max(end);
    }
    out.push_str(&s[cursor.min(s.len())..]);
    normalize_whitespace(&out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_date_dmy() {
        let extractor = DateExtractor::new();

        let result = extractor.extract("30.06.1979");
        assert!(result.is_some());
        assert_eq!(result.unwrap().value, NaiveDate::from_ymd_opt(1979, 6, 30).unwrap());
        assert_eq!(parse_dates_iso("30 06 1979."), vec!["1979-06-30"]);
    }

    #[test]
    fn test_extract_date_ymd() {
        assert_eq!(parse_dates_iso("2021.03.04."), vec!["2021-03-04"]);
        assert_eq!(parse_dates_iso("2021 - 3 - 4"), vec!["2021-03-04"]);
    }

    #[test]
    fn test_month_names() {
        assert_eq!(parse_dates_iso("1979 Júl 30"), vec!["1979-07-30"]);
        assert_eq!(parse_dates_iso("1985 MÁRC/MAR 12"), vec!["1985-03-12"]);
        assert_eq!(parse_dates_iso("2001. április 6."), vec!["2001-04-06"]);
        assert_eq!(parse_dates_iso("12 AUG/AUG 31"), vec!["2031-08-12"]);
        assert_eq!(parse_dates_iso("12 aug 79"), vec!["1979-08-12"]);
    }

    #[test]
    fn test_invalid_calendar_date_dropped() {
        assert!(parse_dates_iso("31.02.2020").is_empty());
        assert!(parse_dates_iso("2020 Foo 12").is_empty());
        assert!(parse_dates_iso("").is_empty());
    }

    #[test]
    fn test_sorted_unique() {
        let text = "valid until 2031.08.12, born 30.06.1979, again 1979.06.30";
        assert_eq!(parse_dates_iso(text), vec!["1979-06-30", "2031-08-12"]);
        assert_eq!(first_date(text), Some("1979-06-30".to_string()));
    }

    #[test]
    fn test_ddmmyy_from_iso() {
        assert_eq!(ddmmyy_from_iso("1979-06-30"), Some("300679".to_string()));
        assert_eq!(ddmmyy_from_iso("2005-01-02"), Some("020105".to_string()));
        assert_eq!(ddmmyy_from_iso("garbage"), None);
    }

    #[test]
    fn test_strip_dates() {
        assert_eq!(strip_dates("BUDAPEST 1979.06.30."), "BUDAPEST");
        assert_eq!(strip_dates("06.04.2001 MIERCUREA CIUC"), "MIERCUREA CIUC");
        assert_eq!(strip_dates("no dates here"), "no dates here");
    }
}
