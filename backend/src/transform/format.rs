//! Document formatter: JSON value -> text.
//!
//! ```text
//! newline         {"name":"Alice"}
//!                 {"name":"Bob"}
//!
//! comma-newline   {"name":"Alice"},
//!                 {"name":"Bob"}
//!
//! array           [
//!                   {
//!                     "name": "Alice"
//!                   },
//!                   ...
//! ```
//!
//! `comma-newline` is a snippet for pasting into another structure, not a
//! standalone JSON document. An empty array is always `[]`.

use serde_json::Value;

use crate::models::JsonFormat;

/// Serialize `value` using the chosen delimiter convention.
pub fn format_document(value: &Value, format: JsonFormat) -> serde_json::Result<String> {
    match format {
        JsonFormat::Array => serde_json::to_string_pretty(value),
        JsonFormat::Newline => join_compact(value, "\n"),
        JsonFormat::CommaNewline => join_compact(value, ",\n"),
    }
}

fn join_compact(value: &Value, separator: &str) -> serde_json::Result<String> {
    match value {
        Value::Array(items) if items.is_empty() => Ok("[]".to_string()),
        Value::Array(items) => {
            let lines = items
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(lines.join(separator))
        }
        // keyed/grouped documents are a single document
        other => serde_json::to_string(other),
    }
}

/// Number of top-level documents a formatted value holds.
pub fn document_count(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::Null => 0,
        _ => 1,
    }
}
