//! Cell type inference.
//!
//! Turns a raw (stringified) cell into a typed JSON scalar:
//!
//! | Input                      | Output          |
//! |----------------------------|-----------------|
//! | null, `""`, whitespace     | `null`          |
//! | `-?\d+(\.\d+)?`            | number          |
//! | `true` / `false` (any case)| boolean         |
//! | anything else              | trimmed string  |

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use crate::models::RawCell;

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("valid numeric pattern"));

/// Largest integer a double represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Infer a typed value for a raw cell. Never fails.
pub fn infer(cell: &RawCell) -> Value {
    let text = match cell {
        Value::Null => return Value::Null,
        Value::String(s) => s.trim(),
        other => return other.clone(),
    };

    if text.is_empty() {
        return Value::Null;
    }

    if NUMERIC.is_match(text) {
        if let Some(number) = parse_number(text) {
            return Value::Number(number);
        }
    }

    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    Value::String(text.to_string())
}

/// Parse a string already known to match the numeric pattern.
///
/// Integral values in the exactly-representable range come out as JSON
/// integers (`"007"` -> `7`, `"1.0"` -> `1`), the rest as floats.
fn parse_number(text: &str) -> Option<Number> {
    let parsed: f64 = text.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    if parsed.fract() == 0.0 && parsed.abs() <= MAX_SAFE_INTEGER {
        return Some(Number::from(parsed as i64));
    }
    Number::from_f64(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integers() {
        assert_eq!(infer(&json!("42")), json!(42));
        assert_eq!(infer(&json!("-3")), json!(-3));
        assert_eq!(infer(&json!(" 007 ")), json!(7));
    }

    #[test]
    fn test_decimals() {
        assert_eq!(infer(&json!("42.5")), json!(42.5));
        assert_eq!(infer(&json!("-0.25")), json!(-0.25));
        assert_eq!(infer(&json!("1.0")), json!(1));
    }

    #[test]
    fn test_non_matching_numbers_stay_strings() {
        assert_eq!(infer(&json!("1e5")), json!("1e5"));
        assert_eq!(infer(&json!("+4")), json!("+4"));
        assert_eq!(infer(&json!(".5")), json!(".5"));
        assert_eq!(infer(&json!("1,000")), json!("1,000"));
    }

    #[test]
    fn test_booleans() {
        assert_eq!(infer(&json!("true")), json!(true));
        assert_eq!(infer(&json!("FALSE")), json!(false));
        assert_eq!(infer(&json!(" True ")), json!(true));
        assert_eq!(infer(&json!("yes")), json!("yes"));
    }

    #[test]
    fn test_empty_values() {
        assert_eq!(infer(&json!(null)), Value::Null);
        assert_eq!(infer(&json!("")), Value::Null);
        assert_eq!(infer(&json!("   ")), Value::Null);
    }

    #[test]
    fn test_strings_are_trimmed() {
        assert_eq!(infer(&json!("abc")), json!("abc"));
        assert_eq!(infer(&json!("  Alice ")), json!("Alice"));
    }

    #[test]
    fn test_large_integer_becomes_float() {
        let v = infer(&json!("12345678901234567890"));
        assert!(v.is_f64());
    }

    #[test]
    fn test_typed_cells_pass_through() {
        assert_eq!(infer(&json!(10)), json!(10));
        assert_eq!(infer(&json!(false)), json!(false));
    }
}
