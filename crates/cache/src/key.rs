//! Default cache key derivation
//!
//! Keys are short and filesystem friendly rather than collision free:
//! sequences only encode their length and mappings keep at most
//! [`MAX_MAPPING_PAIRS`] pairs. Callers that need exact keys should supply
//! their own generator (see [`crate::KeyStrategy`]).

use crate::Arg;
use serde_json::Number;
use std::collections::BTreeMap;

/// Key used when a function is called without arguments
pub const NO_PARAMETERS: &str = "no-parameters";

/// Separator between the keys of consecutive arguments
pub const ARG_SEPARATOR: &str = "__";

/// Number of mapping pairs kept after sorting by key
pub const MAX_MAPPING_PAIRS: usize = 4;

/// Derive the default cache key for an argument list
///
/// Deterministic: equal argument lists always yield equal keys.
#[must_use]
pub fn derive_key(args: &[Arg]) -> String {
    match args {
        [] => NO_PARAMETERS.to_string(),
        [single] => single_key(single),
        [first, rest @ ..] => {
            let combined = format!("{}{ARG_SEPARATOR}{}", single_key(first), derive_key(rest));
            combined.chars().filter(|c| !c.is_whitespace()).collect()
        }
    }
}

fn single_key(arg: &Arg) -> String {
    match arg {
        Arg::Sequence(items) => sequence_name(items),
        Arg::Mapping(map) => mapping_key(map),
        primitive => primitive_text(primitive),
    }
}

fn sequence_name(items: &[Arg]) -> String {
    format!("array-{}", items.len())
}

fn mapping_name(map: &BTreeMap<String, Arg>) -> String {
    format!("object-{}", map.len())
}

// BTreeMap iteration is already sorted by key, so truncation happens after the sort.
fn mapping_key(map: &BTreeMap<String, Arg>) -> String {
    map.iter()
        .take(MAX_MAPPING_PAIRS)
        .map(|(key, value)| {
            let rendered = match value {
                Arg::Sequence(items) => sequence_name(items),
                Arg::Mapping(nested) => mapping_name(nested),
                // joined pairs render absent values as empty text
                Arg::Undefined | Arg::Null => String::new(),
                primitive => primitive_text(primitive),
            };
            format!("{key}={rendered}")
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Text form of a primitive argument
fn primitive_text(arg: &Arg) -> String {
    match arg {
        Arg::Undefined => "undefined".to_string(),
        Arg::Null => "null".to_string(),
        Arg::Bool(b) => b.to_string(),
        Arg::Number(n) => number_text(n),
        Arg::String(s) => s.clone(),
        Arg::Sequence(items) => sequence_name(items),
        Arg::Mapping(map) => mapping_name(map),
    }
}

/// Shortest text for a number, in the form JavaScript prints it
///
/// Integral floats print without a fraction; magnitudes from `1e21` up and
/// below `1e-6` use exponent notation with an explicit sign (`1e+21`, `1e-7`).
fn number_text(number: &Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.abs() >= 1e21 || f.abs() < 1e-6 => exponent_text(f),
        Some(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => number.to_string(),
    }
}

fn exponent_text(f: f64) -> String {
    let text = format!("{f:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => text,
    }
}
