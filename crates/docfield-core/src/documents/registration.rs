//! Vehicle registration certificate (forgalmi engedély).
//!
//! Fields are printed behind the harmonized codes `A`, `B`, `D.1` ... `V.9`
//! plus two Hungarian-only labels. Everything from the first `C.` line on
//! is the holder block and is never read.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::{Extracted, RuleOptions};
use crate::models::fields::RegistrationFields;
use crate::rules::{first_date, parse_dates};
use crate::text::{normalize_lines, LabelPattern, NormalizedText, Recipe, StopLabels};

/// A code standing on its own: no letter or digit glued to its left, and
/// whitespace or end of line to its right.
fn code_label(code: &str) -> Result<LabelPattern, regex::Error> {
    LabelPattern::new(&format!(
        r"(?im)(?:^|[^\p{{L}}\p{{N}}])(?P<label>{code})(?:\s|$)"
    ))
}

lazy_static! {
    static ref A_LABEL: LabelPattern = code_label(r"A\.?").unwrap();
    static ref B_LABEL: LabelPattern = code_label(r"B\.?").unwrap();
    static ref D1_LABEL: LabelPattern = code_label(r"D\s*\.?\s*1").unwrap();
    static ref D2_LABEL: LabelPattern = code_label(r"D\s*\.?\s*2").unwrap();
    static ref D3_LABEL: LabelPattern = code_label(r"D\s*\.?\s*3").unwrap();
    static ref E_LABEL: LabelPattern = code_label(r"E\.?").unwrap();
    static ref F1_LABEL: LabelPattern = code_label(r"F\s*\.?\s*1").unwrap();
    static ref G_LABEL: LabelPattern = code_label(r"G\.?").unwrap();
    static ref H_LABEL: LabelPattern = code_label(r"H\.?").unwrap();
    static ref I_LABEL: LabelPattern = code_label(r"I\.?").unwrap();
    static ref J_LABEL: LabelPattern = code_label(r"J\.?").unwrap();
    static ref K_LABEL: LabelPattern = code_label(r"K\.?").unwrap();
    static ref O_LABEL: LabelPattern = code_label(r"O\.?").unwrap();
    static ref P1_LABEL: LabelPattern = code_label(r"P\s*\.?\s*1").unwrap();
    static ref P2_LABEL: LabelPattern = code_label(r"P\s*\.?\s*2").unwrap();
    static ref P3_LABEL: LabelPattern = code_label(r"P\s*\.?\s*3").unwrap();
    static ref P5_LABEL: LabelPattern = code_label(r"P\s*\.?\s*5").unwrap();
    static ref Q_LABEL: LabelPattern = code_label(r"Q\.?").unwrap();
    static ref R_LABEL: LabelPattern = code_label(r"R\.?").unwrap();
    static ref S1_LABEL: LabelPattern = code_label(r"S\s*\.?\s*1").unwrap();
    static ref S2_LABEL: LabelPattern = code_label(r"S\s*\.?\s*2").unwrap();
    static ref V9_LABEL: LabelPattern = code_label(r"V\s*\.?\s*9").unwrap();

    // towing sub-labels; OCR reads the O as a zero more often than not
    static ref O1_LABEL: LabelPattern = code_label(r"[O0]\s*\.?\s*1").unwrap();
    static ref O2_LABEL: LabelPattern = code_label(r"[O0]\s*\.?\s*2").unwrap();
    static ref PAREN_0_LABEL: LabelPattern = code_label(r"\(\s*0\s*\)").unwrap();
    static ref PAREN_1_LABEL: LabelPattern = code_label(r"\(\s*1\s*\)").unwrap();
    static ref PAREN_2_LABEL: LabelPattern = code_label(r"\(\s*2\s*\)").unwrap();
    static ref PAREN_3_LABEL: LabelPattern = code_label(r"\(\s*3\s*\)").unwrap();

    /// `I` misread as a lone `1` in front of a date.
    static ref I_ALIAS_LABEL: LabelPattern =
        LabelPattern::new(r"(?m)(?:^|\s)(?P<label>1(?:\.\s*|\s+))\d").unwrap();
    /// `J` misread as a lone `1` in front of a category such as `M1`.
    /// A `1` right after `P.` or `S. ` belongs to that code.
    static ref J_ALIAS_LABEL: LabelPattern =
        LabelPattern::new(r"(?im)(?:^|(?:^|[^.])\s)(?P<label>1\.?)\s*[A-Z]\s*\d").unwrap();

    static ref MANUFACTURE_YEAR_LABEL: LabelPattern =
        LabelPattern::new(r"(?im)^\s*GY[AÁ]RT[AÁ]SI\s+[EÉ]V\s*:\s*").unwrap();
    static ref GEARBOX_TYPE_LABEL: LabelPattern = LabelPattern::new(
        r"(?im)^\s*SEBESS[EÉ]GV[AÁ]LT[OÓŐ]\s+FAJT[AÁ]JA(?:\s*\([^)]*\))?\s*:\s*"
    ).unwrap();

    static ref STOPS: StopLabels<'static> = StopLabels::new(vec![
        &*A_LABEL, &*B_LABEL,
        &*D1_LABEL, &*D2_LABEL, &*D3_LABEL,
        &*E_LABEL,
        &*F1_LABEL, &*G_LABEL,
        &*H_LABEL, &*I_LABEL, &*J_LABEL,
        &*K_LABEL,
        &*O_LABEL,
        &*P1_LABEL, &*P2_LABEL, &*P3_LABEL, &*P5_LABEL,
        &*Q_LABEL, &*R_LABEL,
        &*S1_LABEL, &*S2_LABEL,
        &*V9_LABEL,
        &*MANUFACTURE_YEAR_LABEL,
        &*GEARBOX_TYPE_LABEL,
    ]);

    /// Labels that close the towing block.
    static ref TOWING_BLOCK_END: StopLabels<'static> = StopLabels::new(vec![
        &*Q_LABEL, &*G_LABEL, &*R_LABEL,
        &*S1_LABEL, &*S2_LABEL,
        &*V9_LABEL,
        &*MANUFACTURE_YEAR_LABEL,
        &*GEARBOX_TYPE_LABEL,
    ]);

    /// Two letters and five digits, with `1/0` in the letters and `O/I/J`
    /// in the digits tolerated.
    pub(crate) static ref DOCUMENT_NUMBER_VALUE: Regex =
        Regex::new(r"(?i)\b([A-Z10]{2})([0-9OIJ]{5})\b").unwrap();
    pub(crate) static ref VIN_VALUE: Regex =
        Regex::new(r"(?i)(?:^|[^A-Z0-9])([A-Z0-9]{17})(?:[^A-Z0-9]|$)").unwrap();
    /// Hungarian plate: three or four letters, three digits.
    static ref PLATE_VALUE: Regex =
        Regex::new(r"(?i)(?:^|[^A-Z0-9])([A-Z01]{3,4}[0-9OIJLl]{3})(?:[^A-Z0-9]|$)").unwrap();
    pub(crate) static ref KG_VALUE: Regex = Regex::new(r"(?i)\b(\d{2,6})\s*KG\b").unwrap();
    pub(crate) static ref CM3_VALUE: Regex = Regex::new(r"(?i)\b(\d{2,5})\s*CM3\b").unwrap();
    pub(crate) static ref KW_VALUE: Regex = Regex::new(r"(?i)\b(\d{1,4})\s*KW\b").unwrap();
    pub(crate) static ref FUEL_VALUE: Regex =
        Regex::new(r"(?i)\b(BENZIN|DÍZEL|DIESEL|ELEKTROMOS|HIBRID|GÁZ|LPG|CNG)\b").unwrap();
    static ref YEAR_VALUE: Regex = Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap();
    static ref GEARBOX_CODE_VALUE: Regex = Regex::new(r"\b(\d{1,3})\b").unwrap();
    static ref V9_VALUE: Regex = Regex::new(r"\b([0-9]{1,3})\b").unwrap();
}

/// Lines searched for the weight that belongs to a towing anchor.
const TOWING_LOOKAHEAD: usize = 6;

/// `C`, `C.1.1`, `C1` or `C 4` open the holder block.
fn is_holder_block_line(line: &str) -> bool {
    let mut chars = line.trim_start().chars();
    match chars.next() {
        Some('C' | 'c') => match chars.next() {
            None => true,
            Some(next) => next == '.' || next.is_ascii_digit() || next.is_whitespace(),
        },
        _ => false,
    }
}

/// Normalized lines up to the holder block.
fn vehicle_lines(raw: &str) -> Vec<String> {
    normalize_lines(raw)
        .into_iter()
        .take_while(|line| !is_holder_block_line(line))
        .collect()
}

fn has_date(s: &str) -> bool {
    !parse_dates(s).is_empty()
}

fn is_category(s: &str) -> bool {
    s.chars().any(char::is_alphabetic) && s.chars().any(|c| c.is_ascii_digit())
}

fn is_kw_or_kg(s: &str) -> bool {
    KW_VALUE.is_match(s) || KG_VALUE.is_match(s)
}

fn is_count(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) && !s.starts_with('0')
}

/// The document number is printed twice; a token seen fewer than
/// `min_repeats` times is an OCR accident.
pub fn document_number(raw: &str, min_repeats: usize) -> Option<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for caps in DOCUMENT_NUMBER_VALUE.captures_iter(raw) {
        let token = format!("{}{}", &caps[1], &caps[2]).to_uppercase();
        let count = seen.entry(token.clone()).or_insert(0);
        *count += 1;
        if *count >= min_repeats.max(1) {
            return Some(token);
        }
    }
    if !seen.is_empty() {
        debug!(candidates = seen.len(), "registration number never repeated");
    }
    None
}

/// Towing block summary such as `O.1=1200 KG; O.2=650 KG`.
fn towing(lines: &[String]) -> Option<String> {
    let anchors: [(&str, &LabelPattern); 7] = [
        ("O", &*O_LABEL),
        ("O.1", &*O1_LABEL),
        ("O.2", &*O2_LABEL),
        ("(0)", &*PAREN_0_LABEL),
        ("(1)", &*PAREN_1_LABEL),
        ("(2)", &*PAREN_2_LABEL),
        ("(3)", &*PAREN_3_LABEL),
    ];

    let kg_near = |start: usize| {
        let end = lines.len().min(start + TOWING_LOOKAHEAD);
        for (j, line) in lines.iter().enumerate().take(end).skip(start) {
            if j > start && TOWING_BLOCK_END.matches(line) {
                break;
            }
            if let Some(m) = KG_VALUE.find(line) {
                return Some(m.as_str().trim().to_string());
            }
        }
        None
    };

    let mut parts: Vec<String> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        for &(key, label) in &anchors {
            if seen.contains(&key) || !label.is_match(line) {
                continue;
            }
            let Some(kg) = kg_near(i) else {
                continue;
            };
            // a bare `02` right under `S.2` is the standing-places value
            if key == "O.2" && i > 0 && S2_LABEL.is_match(&lines[i - 1]) {
                continue;
            }
            seen.push(key);
            parts.push(format!("{key}={kg}"));
        }
    }

    if parts.is_empty() { None } else { Some(parts.join("; ")) }
}

pub fn extract(text: &NormalizedText<'_>, opts: &RuleOptions) -> Extracted<RegistrationFields> {
    let raw = text.raw();
    let lines = vehicle_lines(raw);
    let lines = lines.as_slice();
    let stops: &StopLabels<'static> = &STOPS;
    let plain = |label: &LabelPattern| Recipe::new(label, stops).extract(lines, raw);
    let dated = |label: &LabelPattern, alias: Option<&LabelPattern>| {
        Recipe::new(label, stops)
            .with_validator(&has_date)
            .extract(lines, raw)
            .or_else(|| {
                alias.and_then(|alias| {
                    Recipe::new(alias, stops)
                        .with_validator(&has_date)
                        .extract(lines, raw)
                })
            })
            .and_then(|v| first_date(&v))
    };

    Extracted {
        document_number: document_number(raw, opts.registration_min_repeats),
        fields: RegistrationFields {
            plate: Recipe::new(&A_LABEL, stops)
                .with_value(&PLATE_VALUE)
                .with_fallback(&PLATE_VALUE)
                .extract(lines, raw),
            first_registration: dated(&B_LABEL, None),
            make: plain(&D1_LABEL),
            vehicle_type: plain(&D2_LABEL),
            commercial_name: plain(&D3_LABEL),
            vin: Recipe::new(&E_LABEL, stops)
                .with_value(&VIN_VALUE)
                .with_fallback(&VIN_VALUE)
                .extract(lines, raw),
            // no fallback: the first KG in the text may well be G's
            max_laden_mass: Recipe::new(&F1_LABEL, stops)
                .with_value(&KG_VALUE)
                .extract(lines, raw),
            mass_in_running_order: Recipe::new(&G_LABEL, stops)
                .with_value(&KG_VALUE)
                .extract(lines, raw),
            validity: plain(&H_LABEL),
            registration_date: dated(&I_LABEL, Some(&*I_ALIAS_LABEL)),
            category: Recipe::new(&J_LABEL, stops)
                .with_validator(&is_category)
                .extract(lines, raw)
                .or_else(|| {
                    Recipe::new(&J_ALIAS_LABEL, stops)
                        .with_validator(&is_category)
                        .extract(lines, raw)
                }),
            type_approval: plain(&K_LABEL),
            towable_mass: towing(lines),
            engine_capacity: Recipe::new(&P1_LABEL, stops)
                .with_value(&CM3_VALUE)
                .with_fallback(&CM3_VALUE)
                .extract(lines, raw),
            max_net_power: Recipe::new(&P2_LABEL, stops)
                .with_value(&KW_VALUE)
                .with_fallback(&KW_VALUE)
                .extract(lines, raw),
            fuel: Recipe::new(&P3_LABEL, stops)
                .with_value(&FUEL_VALUE)
                .with_fallback(&FUEL_VALUE)
                .extract(lines, raw),
            engine_code: plain(&P5_LABEL),
            power_weight_ratio: Recipe::new(&Q_LABEL, stops)
                .with_validator(&is_kw_or_kg)
                .extract(lines, raw),
            colour: plain(&R_LABEL),
            seats: Recipe::new(&S1_LABEL, stops)
                .with_validator(&is_count)
                .extract(lines, raw),
            standing_places: Recipe::new(&S2_LABEL, stops)
                .with_validator(&is_count)
                .extract(lines, raw),
            environmental_class: Recipe::new(&V9_LABEL, stops)
                .with_value(&V9_VALUE)
                .extract(lines, raw),
            manufacture_year: Recipe::new(&MANUFACTURE_YEAR_LABEL, stops)
                .with_value(&YEAR_VALUE)
                .extract(lines, raw),
            gearbox_type: Recipe::new(&GEARBOX_TYPE_LABEL, stops)
                .with_value(&GEARBOX_CODE_VALUE)
                .extract(lines, raw),
        },
    }
}
