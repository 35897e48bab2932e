//! Grammar for condition and answer values.
//!
//! A value is one of:
//! - a plain token (`humedo`, `franco arcilloso`), compared case-insensitively;
//! - a number (`1500`);
//! - a one-sided threshold (`>=2000`, `=>2000`, `<=1000`, `=<1000`);
//! - a closed range (`1000-2000`).
//!
//! Numbers are read by concatenating every ASCII digit in the token, so signs,
//! decimal points and unit suffixes are ignored. Negative and fractional
//! values are therefore not representable.

use super::domain::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Range { low: u64, high: u64 },
    AtLeast(Option<u64>),
    AtMost(Option<u64>),
    Integer(u64),
    Text { digits: Option<u64> },
}

/// A trimmed, lower-cased value together with its parsed shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedValue {
    normalized: String,
    shape: ValueShape,
}

impl ParsedValue {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        let shape = shape_of(&normalized);
        Self { normalized, shape }
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn shape(&self) -> ValueShape {
        self.shape
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn is_range(&self) -> bool {
        matches!(self.shape, ValueShape::Range { .. })
    }

    /// Direction encoded by a `>=`/`<=` style prefix, if any.
    pub fn threshold_direction(&self) -> Option<Operator> {
        match self.shape {
            ValueShape::AtLeast(_) => Some(Operator::AtLeast),
            ValueShape::AtMost(_) => Some(Operator::AtMost),
            _ => None,
        }
    }

    /// Numeric bound of a non-range value, taken from its digits.
    pub fn numeric_bound(&self) -> Option<u64> {
        match self.shape {
            ValueShape::AtLeast(bound) | ValueShape::AtMost(bound) => bound,
            ValueShape::Integer(value) => Some(value),
            ValueShape::Text { digits } => digits,
            ValueShape::Range { .. } => None,
        }
    }

    pub fn text_eq(&self, other: &ParsedValue) -> bool {
        self.normalized == other.normalized
    }
}

/// Concatenate every ASCII digit in `token`; `None` when there are none or the
/// result does not fit in a `u64`.
pub fn extract_digits(token: &str) -> Option<u64> {
    let digits: String = token.chars().filter(|ch| ch.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

const AT_LEAST_PREFIXES: [&str; 2] = [">=", "=>"];
const AT_MOST_PREFIXES: [&str; 2] = ["<=", "=<"];

fn shape_of(normalized: &str) -> ValueShape {
    if let Some(rest) = strip_any_prefix(normalized, &AT_LEAST_PREFIXES) {
        return ValueShape::AtLeast(extract_digits(rest));
    }
    if let Some(rest) = strip_any_prefix(normalized, &AT_MOST_PREFIXES) {
        return ValueShape::AtMost(extract_digits(rest));
    }

    if let Some((left, right)) = normalized.split_once('-') {
        if let (Some(low), Some(high)) = (extract_digits(left), extract_digits(right)) {
            return ValueShape::Range { low, high };
        }
    }

    if !normalized.is_empty() && normalized.chars().all(|ch| ch.is_ascii_digit()) {
        if let Ok(value) = normalized.parse() {
            return ValueShape::Integer(value);
        }
    }

    ValueShape::Text {
        digits: extract_digits(normalized),
    }
}

fn strip_any_prefix<'a>(value: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|prefix| value.strip_prefix(prefix))
}
