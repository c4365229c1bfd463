//! OCR text normalization.
//!
//! Raw OCR output is usually markdown with tables and emphasis markers.
//! Everything downstream works on the cleaned line sequence produced here.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Basic markdown decoration tokens.
    static ref MD_DECOR: Regex = Regex::new(r"[*_`#>]+").unwrap();

    static ref SEX_TOKEN: Regex = Regex::new(r"[A-ZÓŐ]+").unwrap();
}

/// Sex value for female holders.
pub const SEX_FEMALE: &str = "NŐ";
/// Sex value for male holders.
pub const SEX_MALE: &str = "FÉRFI";

/// Collapse every whitespace run to a single space and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markdown decoration and collapse whitespace.
///
/// Applied to a whole text this yields a single line, which is what the
/// global fallback searches run against.
pub fn normalize_ocr_line(s: &str) -> String {
    normalize_whitespace(&MD_DECOR.replace_all(s, ""))
}

/// Split raw OCR text into non-empty, normalized lines.
pub fn normalize_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(normalize_ocr_line)
        .filter(|line| !line.is_empty())
        .collect()
}

/// One OCR text together with its normalized line sequence.
///
/// Built once per extraction call; rule sets only ever borrow it.
#[derive(Debug, Clone)]
pub struct NormalizedText<'a> {
    raw: &'a str,
    lines: Vec<String>,
}

impl<'a> NormalizedText<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            lines: normalize_lines(raw),
        }
    }

    /// The text as received from OCR.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Non-empty normalized lines, in document order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

/// Map an OCR'd sex marker onto `NŐ` or `FÉRFI`.
///
/// Bilingual cards print `NŐ/F` or `FÉRFI/M`; OCR frequently loses the
/// accent, so `NO` and `NÓ` count as female too.
pub fn normalize_sex(raw: &str) -> Option<&'static str> {
    let upper = raw.trim().to_uppercase().replace('Ő', "Ó");
    if upper.is_empty() {
        return None;
    }
    let tokens: Vec<&str> = SEX_TOKEN.find_iter(&upper).map(|m| m.as_str()).collect();
    let has = |t: &str| tokens.iter().any(|tok| *tok == t);

    if has("NÓ") || has("NO") || upper.contains("N/F") {
        return Some(SEX_FEMALE);
    }
    if has("FÉRFI") || has("FERFI") || has("F") || has("M") || upper.contains("F/M") {
        return Some(SEX_MALE);
    }
    None
}

/// Canonicalize a Hungarian ID card number to `ddddddXX`.
///
/// The digit zone folds `O→0` and `I/L/|→1`, the letter zone folds
/// `0→O` and `1/L/|→I`. Anything that does not reduce to six digits
/// followed by two letters is rejected.
pub fn normalize_id_number(raw: &str) -> Option<String> {
    let s: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let chars: Vec<char> = s.chars().collect();
    if chars.len() != 8 {
        return None;
    }

    let digits: String = chars[..6]
        .iter()
        .map(|c| match c {
            'O' => '0',
            'I' | 'L' | '|' => '1',
            other => *other,
        })
        .collect();
    let letters: String = chars[6..]
        .iter()
        .map(|c| match c {
            '0' => 'O',
            '1' | 'L' | '|' => 'I',
            other => *other,
        })
        .collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !letters.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    Some(format!("{digits}{letters}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_lines_strips_markdown() {
        let text = "# **Name**\n\n  | KOVÁCS   JÁNOS |  \n> `note`\n***\n";
        assert_eq!(
            normalize_lines(text),
            vec!["Name", "| KOVÁCS JÁNOS |", "note"]
        );
    }

    #[test]
    fn test_normalize_lines_empty() {
        assert!(normalize_lines("").is_empty());
        assert!(normalize_lines("   \n\t\n**").is_empty());
    }

    #[test]
    fn test_normalize_ocr_line_joins_text() {
        assert_eq!(normalize_ocr_line("A\n  B\t_C_"), "A B C");
    }

    #[test]
    fn test_normalized_text() {
        let doc = NormalizedText::new("line one\n\nline two");
        assert_eq!(doc.lines().len(), 2);
        assert!(!doc.is_empty());
        assert!(NormalizedText::new("  ").is_empty());
    }

    #[test]
    fn test_normalize_sex() {
        assert_eq!(normalize_sex("NŐ/F"), Some(SEX_FEMALE));
        assert_eq!(normalize_sex("no"), Some(SEX_FEMALE));
        assert_eq!(normalize_sex("N/F"), Some(SEX_FEMALE));
        assert_eq!(normalize_sex("FÉRFI/M"), Some(SEX_MALE));
        assert_eq!(normalize_sex("ferfi"), Some(SEX_MALE));
        assert_eq!(normalize_sex("M"), Some(SEX_MALE));
        assert_eq!(normalize_sex("X"), None);
        assert_eq!(normalize_sex(""), None);
    }

    #[test]
    fn test_normalize_sex_is_idempotent() {
        for raw in ["NŐ/F", "FÉRFI/M", "n", "M"] {
            if let Some(once) = normalize_sex(raw) {
                assert_eq!(normalize_sex(once), Some(once));
            }
        }
    }

    #[test]
    fn test_normalize_id_number() {
        assert_eq!(normalize_id_number("123456AB"), Some("123456AB".to_string()));
        assert_eq!(normalize_id_number("12345 6ab"), Some("123456AB".to_string()));
        assert_eq!(normalize_id_number("I2O4S6A1"), None);
        assert_eq!(normalize_id_number("L2O456A0"), Some("120456AO".to_string()));
        assert_eq!(normalize_id_number("1234567A"), None);
        assert_eq!(normalize_id_number("123456ABC"), None);
    }

    #[test]
    fn test_normalize_id_number_is_idempotent() {
        let once = normalize_id_number("I23O56A1").unwrap();
        assert_eq!(normalize_id_number(&once), Some(once.clone()));
    }
}
