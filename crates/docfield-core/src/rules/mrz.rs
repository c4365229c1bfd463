//! TD1 machine-readable zone decoding (ICAO 9303).
//!
//! OCR rarely returns the zone cleanly: lines get split, fillers come
//! back as `«` or `&lt;`, and labels above the zone can look MRZ-like.
//! Every run of three consecutive MRZ-like lines is scored and the best
//! one is decoded.

use chrono::{Datelike, Local, NaiveDate};
use tracing::debug;

use super::FieldExtractor;
use crate::text::{normalize_lines, normalize_whitespace};

/// TD1 line length.
pub const TD1_LINE_LEN: usize = 30;

const MRZISH_MIN: usize = 20;
const MRZISH_MAX: usize = 40;
const DOB_CHECK_BONUS: i32 = 5;
const CHECK_WEIGHTS: [u32; 3] = [7, 3, 1];

/// Three TD1 lines, each exactly 30 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrzBlock {
    pub lines: [String; 3],
    /// Index of the first line within the normalized line sequence.
    pub start_line: usize,
    /// Heuristic quality; higher is better.
    pub score: i32,
}

/// Sub-fields decoded from an MRZ block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MrzFields {
    pub document_number: Option<String>,
    pub full_name: Option<String>,
    /// ISO-8601.
    pub birth_date: Option<String>,
}

/// ICAO 9303 character value: digits as-is, `A-Z` as 10-35, anything else 0.
fn char_value(c: char) -> u32 {
    match c {
        '0'..='9' => c as u32 - '0' as u32,
        'A'..='Z' => c as u32 - 'A' as u32 + 10,
        _ => 0,
    }
}

/// ICAO 9303 check digit of a field.
pub fn check_digit(field: &str) -> u32 {
    field
        .chars()
        .zip(CHECK_WEIGHTS.iter().cycle())
        .map(|(c, w)| char_value(c) * w)
        .sum::<u32>()
        % 10
}

/// A check character passes when it is a filler or equals the computed digit.
fn check_passes(field: &str, check: Option<char>) -> bool {
    match check.and_then(|c| c.to_digit(10)) {
        Some(digit) => digit == check_digit(field),
        None => true,
    }
}

fn html_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&#60;", "<")
        .replace("&#x3C;", "<")
        .replace("&#x3c;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Reduce an OCR line to the MRZ alphabet `[A-Z0-9<]`.
pub fn clean_line(line: &str) -> String {
    html_unescape(line)
        .to_uppercase()
        .chars()
        .map(|c| match c {
            '«' | '‹' | '›' => '<',
            other => other,
        })
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '<')
        .collect()
}

fn is_mrzish(cleaned: &str) -> bool {
    (MRZISH_MIN..=MRZISH_MAX).contains(&cleaned.len())
}

fn pad_or_trim(s: &str) -> String {
    let mut out: String = s.chars().take(TD1_LINE_LEN).collect();
    while out.len() < TD1_LINE_LEN {
        out.push('<');
    }
    out
}

/// Locates and decodes TD1 zones.
pub struct MrzExtractor {
    reference_year: Option<i32>,
}

impl MrzExtractor {
    pub fn new() -> Self {
        Self {
            reference_year: None,
        }
    }

    /// Fix the year used as the birth-date century pivot.
    pub fn with_reference_year(mut self, year: Option<i32>) -> Self {
        self.reference_year = year;
        self
    }

    fn pivot(&self) -> i32 {
        self.reference_year.unwrap_or_else(|| Local::now().year()) % 100
    }

    /// Every candidate triple, in line order.
    pub fn candidates(&self, lines: &[String]) -> Vec<MrzBlock> {
        let cleaned: Vec<Option<String>> = lines
            .iter()
            .map(|line| Some(clean_line(line)).filter(|c| is_mrzish(c)))
            .collect();

        cleaned
            .windows(3)
            .enumerate()
            .filter_map(|(start, window)| {
                let [Some(a), Some(b), Some(c)] = window else {
                    return None;
                };
                let raw = [a, b, c];
                let padded = raw.map(|l| pad_or_trim(l));
                let mut score: i32 = raw
                    .iter()
                    .map(|l| -(l.len() as i32 - TD1_LINE_LEN as i32).abs())
                    .sum();

                let dob = &padded[1][0..6];
                let dob_check = padded[1].chars().nth(6);
                if dob.chars().all(|c| c.is_ascii_digit())
                    && dob_check.is_some_and(|c| c.to_digit(10) == Some(check_digit(dob)))
                {
                    score += DOB_CHECK_BONUS;
                }

                Some(MrzBlock {
                    lines: padded,
                    start_line: start,
                    score,
                })
            })
            .collect()
    }

    /// Highest scoring triple; the earliest wins a tie.
    pub fn find_block(&self, lines: &[String]) -> Option<MrzBlock> {
        let mut best: Option<MrzBlock> = None;
        for block in self.candidates(lines) {
            if best.as_ref().is_none_or(|b| block.score > b.score) {
                best = Some(block);
            }
        }
        if let Some(block) = &best {
            debug!(start_line = block.start_line, score = block.score, "MRZ block selected");
        }
        best
    }

    /// Decode document number, name and birth date.
    pub fn decode(&self, block: &MrzBlock) -> MrzFields {
        MrzFields {
            document_number: document_number(&block.lines[0]),
            full_name: full_name(&block.lines[2]),
            birth_date: birth_date(&block.lines[1], self.pivot()),
        }
    }
}

impl Default for MrzExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for MrzExtractor {
    type Output = MrzFields;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let lines = normalize_lines(text);
        self.find_block(&lines).map(|block| self.decode(&block))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let lines = normalize_lines(text);
        self.candidates(&lines)
            .iter()
            .map(|block| self.decode(block))
            .collect()
    }
}

/// Line 1, positions 6-14, verified against position 15.
fn document_number(line1: &str) -> Option<String> {
    let field = line1.get(5..14)?;
    if !check_passes(field, line1.chars().nth(14)) {
        debug!("MRZ document number check digit mismatch");
        return None;
    }
    let stripped: String = field.chars().filter(|c| *c != '<').collect();
    if stripped.len() < 8 {
        return None;
    }
    Some(stripped.chars().take(8).collect())
}

/// Line 3: `SURNAME<<GIVEN<NAMES`.
fn full_name(line3: &str) -> Option<String> {
    let fillers_to_spaces = |s: &str| normalize_whitespace(&s.replace('<', " "));
    let name = match line3.split_once("<<") {
        Some((surname, given)) => {
            let parts = [fillers_to_spaces(surname), fillers_to_spaces(given)];
            parts
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        }
        None => fillers_to_spaces(line3),
    };
    if name.is_empty() { None } else { Some(name) }
}

/// Line 2, `YYMMDD` plus check digit.
fn birth_date(line2: &str, pivot: i32) -> Option<String> {
    let token = line2.get(0..6)?;
    if !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !check_passes(token, line2.chars().nth(6)) {
        debug!("MRZ birth date check digit mismatch");
        return None;
    }
    let yy: i32 = token[0..2].parse().ok()?;
    let month: u32 = token[2..4].parse().ok()?;
    let day: u32 = token[4..6].parse().ok()?;
    let year = if yy > pivot { 1900 + yy } else { 2000 + yy };
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.to_string())
}
