//! Identifier normalization
//!
//! Cluster ids reach us from dataframes that were serialized by a dynamically
//! typed producer: integers, floats (`3.0`), numeric strings, and formatted
//! labels such as `"Topic 14"` or `"14_alpha_beta"` all show up in the same
//! column. [`normalize_id`] collapses every one of those into a canonical
//! `i64` or [`NormalizedId::Unrepresentable`]. Callers skip unrepresentable
//! ids; nothing here can fail.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// The reserved cluster id meaning "document assigned to no topic".
pub const OUTLIER_TOPIC: i64 = -1;

static TRAILING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?[0-9]+)$").expect("trailing digit pattern is valid"));
static EMBEDDED_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?[0-9]+)").expect("embedded digit pattern is valid"));

/// Outcome of normalizing a loosely typed identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalizedId {
    /// A canonical integer id
    Id(i64),
    /// The value cannot be read as an id
    Unrepresentable,
}

impl NormalizedId {
    /// The integer id, if any
    pub fn get(self) -> Option<i64> {
        match self {
            NormalizedId::Id(id) => Some(id),
            NormalizedId::Unrepresentable => None,
        }
    }

    /// The integer id unless it is the outlier sentinel
    pub fn topic(self) -> Option<i64> {
        self.get().filter(|&id| id != OUTLIER_TOPIC)
    }

    /// Check whether this is the outlier sentinel
    pub fn is_outlier(self) -> bool {
        self == NormalizedId::Id(OUTLIER_TOPIC)
    }
}

impl From<Option<i64>> for NormalizedId {
    fn from(value: Option<i64>) -> Self {
        value.map_or(NormalizedId::Unrepresentable, NormalizedId::Id)
    }
}

/// A text rule returns `None` when it does not apply, letting the next rule try.
type TextRule = fn(&str) -> Option<NormalizedId>;

/// Text rules, tried in order. The first rule that applies decides.
///
/// A direct integer parse is not listed: any text it accepts contains a digit
/// run, which `embedded_digits` has already claimed.
const TEXT_RULES: &[(&str, TextRule)] = &[
    ("trailing_digits", trailing_digits),
    ("embedded_digits", embedded_digits),
];

/// Normalize an arbitrary scalar into a canonical id.
///
/// - `null` and booleans are unrepresentable
/// - integers map to themselves (unsigned values above `i64::MAX` are unrepresentable)
/// - floats truncate toward zero; NaN, infinities and out-of-range values are unrepresentable
/// - anything else is read as text (see [`normalize_text_id`])
pub fn normalize_id(value: &Value) -> NormalizedId {
    match value {
        Value::Null | Value::Bool(_) => NormalizedId::Unrepresentable,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                NormalizedId::Id(i)
            } else if n.is_u64() {
                NormalizedId::Unrepresentable
            } else {
                n.as_f64().map_or(NormalizedId::Unrepresentable, normalize_float_id)
            }
        }
        Value::String(s) => normalize_text_id(s),
        other => normalize_text_id(&other.to_string()),
    }
}

/// Truncate a float id toward zero.
pub fn normalize_float_id(value: f64) -> NormalizedId {
    if !value.is_finite() {
        return NormalizedId::Unrepresentable;
    }
    let truncated = value.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return NormalizedId::Unrepresentable;
    }
    NormalizedId::Id(truncated as i64)
}

/// Normalize a textual id such as `"14"`, `"Topic 14"` or `"14_alpha"`.
///
/// A trailing signed run of digits wins over the first embedded run. Text
/// without digits is unrepresentable, and so is a matched run that overflows
/// `i64` (it does not fall through to the next rule).
pub fn normalize_text_id(text: &str) -> NormalizedId {
    TEXT_RULES
        .iter()
        .find_map(|(_, rule)| rule(text))
        .unwrap_or(NormalizedId::Unrepresentable)
}

fn trailing_digits(text: &str) -> Option<NormalizedId> {
    TRAILING_DIGITS
        .captures(text.trim())
        .map(|caps| parse_digits(&caps[1]))
}

fn embedded_digits(text: &str) -> Option<NormalizedId> {
    EMBEDDED_DIGITS
        .captures(text)
        .map(|caps| parse_digits(&caps[1]))
}

fn parse_digits(digits: &str) -> NormalizedId {
    digits.parse::<i64>().ok().into()
}

/// Leniently read a float from a loosely typed scalar.
///
/// Numbers are taken as-is and strings are trimmed and parsed. `null`, empty
/// strings, booleans and compound values give `None`. Non-finite values are
/// returned unchanged; callers decide what NaN means for them.
pub fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}
