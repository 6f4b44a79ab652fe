//! Typed values inferred from OIF user-area text.

use std::fmt;

/// A typed metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Logical value (`T`/`F`, `true`/`false`).
    Logical(bool),
    /// Whole number.
    Integer(i64),
    /// Decimal or exponential number.
    Float(f64),
    /// Anything else, with surrounding single quotes removed.
    String(String),
}

/// Infer the type of a raw value string.
///
/// The checks run in a fixed order: boolean keyword, integer, float, and
/// finally string. Failing to parse as a number is not an error; the text
/// simply stays a string.
pub fn infer(text: &str) -> Value {
    match text.to_ascii_lowercase().as_str() {
        "t" | "true" => return Value::Logical(true),
        "f" | "false" => return Value::Logical(false),
        _ => {}
    }

    if let Ok(n) = text.parse::<i64>() {
        return Value::Integer(n);
    }

    // Fortran `D` exponents are accepted alongside `E`.
    if looks_numeric(text) {
        if let Ok(x) = text.replace(&['d', 'D'][..], "e").parse::<f64>() {
            return Value::Float(x);
        }
    }

    Value::String(String::from(text.trim_matches('\'')))
}

/// Only digits, signs, a decimal point and exponent markers. Keeps `inf`
/// and `nan` out of the float branch.
fn looks_numeric(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit())
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E' | b'd' | b'D'))
}

impl fmt::Display for Value {
    /// Render the value the way it would appear on an OIF card line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Logical(b) => f.write_str(if *b { "T" } else { "F" }),
            Value::Integer(n) => write!(f, "{n}"),
            // Debug keeps a decimal point or exponent, so the text re-infers as Float.
            Value::Float(x) => write!(f, "{x:?}"),
            Value::String(s) => write!(f, "'{s}'"),
        }
    }
}
