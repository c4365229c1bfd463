//! Document-agnostic label/value scanning primitives.
//!
//! Every rule set is built from these. A field is located by its label,
//! then resolved in a fixed order: the rest of the label line, then the
//! following lines up to the next stop label, then an optional search
//! over the whole text.

use regex::Regex;

use super::normalize::normalize_ocr_line;

/// Characters stripped between a label and its value.
const VALUE_PREFIX_CHARS: &[char] = &[':', '.', ' '];

/// Span of a label occurrence inside a line (byte offsets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMatch {
    pub start: usize,
    pub end: usize,
}

/// A compiled label recognizer.
///
/// When the pattern has a named group `label`, that group's span is the
/// label occurrence; the rest of the pattern only describes context
/// (word boundaries, what may follow). Otherwise the whole match is used.
#[derive(Debug, Clone)]
pub struct LabelPattern {
    regex: Regex,
}

impl LabelPattern {
    /// Compile a label pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Locate the first label occurrence in `line`.
    pub fn find(&self, line: &str) -> Option<LabelMatch> {
        let caps = self.regex.captures(line)?;
        let m = caps.name("label").or_else(|| caps.get(0))?;
        Some(LabelMatch {
            start: m.start(),
            end: m.end(),
        })
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Labels that terminate a value scan.
#[derive(Debug, Clone, Default)]
pub struct StopLabels<'a> {
    patterns: Vec<&'a LabelPattern>,
}

impl<'a> StopLabels<'a> {
    pub fn new(patterns: Vec<&'a LabelPattern>) -> Self {
        Self { patterns }
    }

    /// Add a label to the set.
    pub fn with(mut self, pattern: &'a LabelPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// True if the line is itself a label line.
    pub fn matches(&self, line: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(line))
    }

    /// Byte offset of the earliest label occurrence in `s`.
    pub fn earliest(&self, s: &str) -> Option<usize> {
        self.patterns
            .iter()
            .filter_map(|p| p.find(s).map(|m| m.start))
            .min()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// First line at or after `start` containing the label.
pub fn find_first_label(
    lines: &[String],
    label: &LabelPattern,
    start: usize,
) -> Option<(usize, LabelMatch)> {
    lines
        .iter()
        .enumerate()
        .skip(start)
        .find_map(|(idx, line)| label.find(line).map(|m| (idx, m)))
}

/// Index of the first line at or after `start` containing the label.
pub fn find_label_idx(lines: &[String], label: &LabelPattern, start: usize) -> Option<usize> {
    find_first_label(lines, label, start).map(|(idx, _)| idx)
}

/// Text after the label match with leading separators stripped.
pub fn value_after_match(line: &str, m: LabelMatch) -> String {
    line.get(m.end..)
        .unwrap_or("")
        .trim()
        .trim_start_matches(VALUE_PREFIX_CHARS)
        .trim()
        .to_string()
}

/// Normalized tail after the first `:` at or after `start_pos`.
pub fn value_after_colon(line: &str, start_pos: usize) -> Option<String> {
    let tail = line.get(start_pos..)?;
    let pos = tail.find(':')?;
    let value = normalize_ocr_line(&tail[pos + 1..]);
    if value.is_empty() { None } else { Some(value) }
}

/// Truncate `remainder` where the next stop label begins.
pub fn cut_at_next_label(remainder: &str, stops: &StopLabels<'_>) -> String {
    let cut = stops.earliest(remainder).unwrap_or(remainder.len());
    remainder[..cut].trim().to_string()
}

pub fn is_stop_label(line: &str, stops: &StopLabels<'_>) -> bool {
    stops.matches(line)
}

/// Immediate next non-empty line after `idx`.
pub fn next_non_empty(lines: &[String], idx: usize) -> Option<&str> {
    lines
        .iter()
        .skip(idx + 1)
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
}

/// Line following the first occurrence of the label.
pub fn nextline_value<'l>(lines: &'l [String], label: &LabelPattern) -> Option<&'l str> {
    let (idx, _) = find_first_label(lines, label, 0)?;
    next_non_empty(lines, idx)
}

/// Outcome of a guarded next-line lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardedValue<'l> {
    pub value: Option<&'l str>,
    pub found_label: bool,
    pub blocked_by_stop: bool,
}

/// Like [`nextline_value`], but refuses a next line that is itself a label.
pub fn nextline_value_guarded<'l>(
    lines: &'l [String],
    label: &LabelPattern,
    stops: &StopLabels<'_>,
) -> GuardedValue<'l> {
    let Some((idx, _)) = find_first_label(lines, label, 0) else {
        return GuardedValue::default();
    };
    match next_non_empty(lines, idx) {
        None => GuardedValue {
            found_label: true,
            ..GuardedValue::default()
        },
        Some(line) if stops.matches(line) => GuardedValue {
            value: None,
            found_label: true,
            blocked_by_stop: true,
        },
        Some(line) => GuardedValue {
            value: Some(line),
            found_label: true,
            blocked_by_stop: false,
        },
    }
}

/// Walk forward from `start_idx + 1`.
///
/// Returns `None` as soon as a stop line is met, skips lines matched by
/// `skip`, and yields the first line accepted by `accept`. With
/// `max_lines` the walk covers at most that many lines.
pub fn scan_forward<'l>(
    lines: &'l [String],
    start_idx: usize,
    stop: impl Fn(&str) -> bool,
    skip: impl Fn(&str) -> bool,
    accept: impl Fn(&str) -> bool,
    max_lines: Option<usize>,
) -> Option<&'l str> {
    let end = match max_lines {
        Some(max) => lines.len().min(start_idx + 1 + max),
        None => lines.len(),
    };
    for line in lines.get(start_idx + 1..end).unwrap_or(&[]) {
        let cur = line.trim();
        if cur.is_empty() {
            continue;
        }
        if stop(cur) {
            return None;
        }
        if skip(cur) {
            continue;
        }
        if accept(cur) {
            return Some(cur);
        }
    }
    None
}

/// Whole-text search, used when label-anchored search fails.
///
/// Runs against the text collapsed onto one normalized line and prefers
/// the first capture group.
pub fn fallback_value(text: &str, pattern: &Regex) -> Option<String> {
    let collapsed = normalize_ocr_line(text);
    let haystack = if collapsed.is_empty() { text } else { &collapsed };
    let caps = pattern.captures(haystack)?;
    let m = if pattern.captures_len() > 1 {
        caps.get(1)
    } else {
        caps.get(0)
    };
    let value = m.map(|m| m.as_str().trim()).unwrap_or("");
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Values of every line matching an inline `label: value` pattern.
///
/// Takes the named group `value`, else the last capture group.
pub fn inline_values<'l>(
    lines: &'l [String],
    pattern: &'l Regex,
) -> impl Iterator<Item = String> + 'l {
    lines.iter().filter_map(move |line| {
        let caps = pattern.captures(line)?;
        let m = caps
            .name("value")
            .or_else(|| (1..caps.len()).rev().find_map(|i| caps.get(i)))?;
        let value = normalize_ocr_line(m.as_str());
        if value.is_empty() { None } else { Some(value) }
    })
}

/// First inline `label: value` match.
pub fn inline_value(lines: &[String], pattern: &Regex) -> Option<String> {
    inline_values(lines, pattern).next()
}

type LinePredicate<'a> = &'a dyn Fn(&str) -> bool;

/// One field's extraction recipe.
///
/// ```ignore
/// let value = Recipe::new(&LABEL, &STOPS)
///     .with_value(&VIN_VALUE)
///     .with_fallback(&VIN_VALUE)
///     .extract(lines, text);
/// ```
pub struct Recipe<'a> {
    label: &'a LabelPattern,
    stops: &'a StopLabels<'a>,
    value: Option<&'a Regex>,
    validator: Option<LinePredicate<'a>>,
    skip: Option<LinePredicate<'a>>,
    fallback: Option<&'a Regex>,
}

impl<'a> Recipe<'a> {
    pub fn new(label: &'a LabelPattern, stops: &'a StopLabels<'a>) -> Self {
        Self {
            label,
            stops,
            value: None,
            validator: None,
            skip: None,
            fallback: None,
        }
    }

    /// Require candidates to contain a match of this value shape.
    pub fn with_value(mut self, value: &'a Regex) -> Self {
        self.value = Some(value);
        self
    }

    /// Require candidates to satisfy a predicate.
    pub fn with_validator(mut self, validator: LinePredicate<'a>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Ignore lines matching this predicate during the forward scan.
    pub fn with_skip(mut self, skip: LinePredicate<'a>) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Search the whole text with this pattern as a last resort.
    pub fn with_fallback(mut self, fallback: &'a Regex) -> Self {
        self.fallback = Some(fallback);
        self
    }

    fn accepts(&self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        if let Some(validator) = self.validator {
            if !validator(candidate) {
                return false;
            }
        }
        if let Some(value) = self.value {
            if !value.is_match(candidate) {
                return false;
            }
        }
        true
    }

    fn run_fallback(&self, full_text: &str) -> Option<String> {
        self.fallback
            .and_then(|pattern| fallback_value(full_text, pattern))
    }

    /// Run the recipe: same line, then forward scan, then fallback.
    pub fn extract(&self, lines: &[String], full_text: &str) -> Option<String> {
        let Some((idx, m)) = find_first_label(lines, self.label, 0) else {
            return self.run_fallback(full_text);
        };

        let remainder = value_after_match(&lines[idx], m);
        if !remainder.is_empty() {
            let cut = cut_at_next_label(&remainder, self.stops);
            let candidate = if cut.is_empty() { remainder } else { cut };
            if self.accepts(&candidate) {
                return Some(candidate);
            }
        }

        let scanned = scan_forward(
            lines,
            idx,
            |line| self.stops.matches(line),
            |line| self.skip.is_some_and(|skip| skip(line)),
            |line| self.accepts(line),
            None,
        );
        if let Some(value) = scanned {
            return Some(value.to_string());
        }

        self.run_fallback(full_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<String> {
        crate::text::normalize_lines(text)
    }

    fn label(pattern: &str) -> LabelPattern {
        LabelPattern::new(pattern).unwrap()
    }

    #[test]
    fn test_label_group_span() {
        let pat = label(r"(?i)(?:^|[^A-Z0-9])(?P<label>B\.?)(?:\s|$)");
        let m = pat.find("xx B. 2020").unwrap();
        assert_eq!((m.start, m.end), (3, 5));
        assert!(pat.find("AB 2020").is_none());
    }

    #[test]
    fn test_find_first_label_from_start() {
        let ls = lines("NAME\nfoo\nNAME\nbar");
        let pat = label("NAME");
        assert_eq!(find_label_idx(&ls, &pat, 0), Some(0));
        assert_eq!(find_label_idx(&ls, &pat, 1), Some(2));
        assert_eq!(find_label_idx(&ls, &pat, 3), None);
    }

    #[test]
    fn test_value_after_match_strips_separators() {
        let pat = label("Név");
        let line = "Név: . KOVÁCS JÁNOS ";
        let m = pat.find(line).unwrap();
        assert_eq!(value_after_match(line, m), "KOVÁCS JÁNOS");
    }

    #[test]
    fn test_value_after_colon() {
        assert_eq!(
            value_after_colon("KÓD / CODE: HUN", 0),
            Some("HUN".to_string())
        );
        assert_eq!(value_after_colon("no colon", 0), None);
        assert_eq!(value_after_colon("A: ", 0), None);
    }

    #[test]
    fn test_cut_at_next_label() {
        let a = label("NAME");
        let b = label("SEX");
        let stops = StopLabels::new(vec![&a, &b]);
        assert_eq!(cut_at_next_label("KOVÁCS JÁNOS SEX M", &stops), "KOVÁCS JÁNOS");
        assert_eq!(cut_at_next_label("KOVÁCS JÁNOS", &stops), "KOVÁCS JÁNOS");
    }

    #[test]
    fn test_nextline_value_guarded() {
        let a = label("BIRTH PLACE");
        let b = label("MOTHER");
        let stops = StopLabels::new(vec![&a, &b]);

        let ls = lines("BIRTH PLACE\nMOTHER\nANNA");
        let got = nextline_value_guarded(&ls, &a, &stops);
        assert_eq!(got.value, None);
        assert!(got.found_label);
        assert!(got.blocked_by_stop);

        let ls = lines("BIRTH PLACE\nBUDAPEST");
        assert_eq!(nextline_value_guarded(&ls, &a, &stops).value, Some("BUDAPEST"));
        assert_eq!(nextline_value_guarded(&lines("x"), &a, &stops), GuardedValue::default());
    }

    #[test]
    fn test_scan_forward_stops_and_skips() {
        let ls = lines("LABEL\nC.1 noise\nvalue\nSTOP\nlater");
        let got = scan_forward(&ls, 0, |l| l == "STOP", |l| l.starts_with("C."), |_| true, None);
        assert_eq!(got, Some("value"));

        let got = scan_forward(&ls, 0, |l| l == "STOP", |_| false, |l| l == "later", None);
        assert_eq!(got, None);

        let got = scan_forward(&ls, 0, |_| false, |_| false, |l| l == "later", Some(2));
        assert_eq!(got, None);
    }

    #[test]
    fn test_fallback_prefers_first_group() {
        let re = Regex::new(r"(\d{2,6})\s*KG").unwrap();
        assert_eq!(fallback_value("mass\n1350 kg", &re), None);
        assert_eq!(fallback_value("mass\n1350 KG", &re), Some("1350".to_string()));
        let whole = Regex::new(r"\d{4}").unwrap();
        assert_eq!(fallback_value("x 2020 y", &whole), Some("2020".to_string()));
    }

    #[test]
    fn test_inline_value() {
        let re = Regex::new(r"(?i)\bSEX\b\s*[:.]\s*(?P<value>.+?)\s*$").unwrap();
        let ls = lines("NAME: X\nSEX: M");
        assert_eq!(inline_value(&ls, &re), Some("M".to_string()));
    }

    #[test]
    fn test_recipe_priority() {
        let lab = label("E");
        let other = label("F1");
        let stops = StopLabels::new(vec![&lab, &other]);
        let vin = Regex::new(r"([A-Z0-9]{17})").unwrap();

        // same line wins
        let ls = lines("E WVWZZZ1JZXW000001\nWVWZZZ1JZXW000002");
        let got = Recipe::new(&lab, &stops).with_value(&vin).extract(&ls, "");
        assert_eq!(got, Some("WVWZZZ1JZXW000001".to_string()));

        // then the next accepted line
        let ls = lines("E\nnoise\nWVWZZZ1JZXW000002");
        let got = Recipe::new(&lab, &stops).with_value(&vin).extract(&ls, "");
        assert_eq!(got, Some("WVWZZZ1JZXW000002".to_string()));

        // stop label ends the scan, fallback takes over
        let text = "E\nF1\nWVWZZZ1JZXW000003";
        let ls = lines(text);
        let recipe = Recipe::new(&lab, &stops).with_value(&vin);
        assert_eq!(recipe.extract(&ls, text), None);
        let recipe = recipe.with_fallback(&vin);
        assert_eq!(recipe.extract(&ls, text), Some("WVWZZZ1JZXW000003".to_string()));
    }

    #[test]
    fn test_recipe_missing_label() {
        let lab = label("NOPE");
        let stops = StopLabels::default();
        let year = Regex::new(r"(19|20)\d{2}").unwrap();
        let ls = lines("built 1999");
        assert_eq!(Recipe::new(&lab, &stops).extract(&ls, "built 1999"), None);
        assert_eq!(
            Recipe::new(&lab, &stops)
                .with_fallback(&year)
                .extract(&ls, "built 1999"),
            Some("19".to_string())
        );
    }

    #[test]
    fn test_recipe_validator_and_skip() {
        let lab = label("B");
        let stops = StopLabels::new(vec![&lab]);
        let has_digit = |s: &str| s.chars().any(|c| c.is_ascii_digit());
        let skip_c = |s: &str| s.starts_with("C.");
        let ls = lines("B\nC.1 4\nfirst 2020");
        let got = Recipe::new(&lab, &stops)
            .with_validator(&has_digit)
            .with_skip(&skip_c)
            .extract(&ls, "");
        assert_eq!(got, Some("first 2020".to_string()));
    }
}
