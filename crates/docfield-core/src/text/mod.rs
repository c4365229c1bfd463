//! Line-oriented text handling shared by every document rule set.

pub mod normalize;
pub mod scanner;

pub use normalize::{
    normalize_id_number, normalize_lines, normalize_ocr_line, normalize_sex, normalize_whitespace,
    NormalizedText,
};
pub use scanner::{LabelPattern, Recipe, StopLabels};
