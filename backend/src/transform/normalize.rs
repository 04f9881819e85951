//! Sheet normalization: header extraction and blank-header column pruning.
//!
//! A column whose header trims to `""` is dropped from the header list and
//! from every row, once, here. No later stage ever sees it.

use serde_json::Value;

use crate::models::{cell_to_string, NormalizedSheet, RawGrid};

/// Build a [`NormalizedSheet`] from a decoded grid.
///
/// Row 0 provides the headers. Ragged rows are padded with null so every
/// output row has exactly `headers.len()` cells.
pub fn normalize_sheet(grid: &RawGrid, name: &str) -> NormalizedSheet {
    let Some(header_row) = grid.first() else {
        return NormalizedSheet::empty(name);
    };

    let mut headers = Vec::new();
    let mut valid_columns = Vec::new();

    for (idx, cell) in header_row.iter().enumerate() {
        let header = cell_to_string(cell).trim().to_string();
        if !header.is_empty() {
            headers.push(header);
            valid_columns.push(idx);
        }
    }

    if headers.is_empty() {
        return NormalizedSheet::empty(name);
    }

    let data = grid
        .iter()
        .map(|row| {
            valid_columns
                .iter()
                .map(|&idx| row.get(idx).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    NormalizedSheet {
        name: name.to_string(),
        headers,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grid(rows: Value) -> RawGrid {
        serde_json::from_value(rows).unwrap()
    }

    #[test]
    fn test_blank_header_column_dropped() {
        let raw = grid(json!([["name", "", "age"], ["A", "x", 10]]));
        let sheet = normalize_sheet(&raw, "S");

        assert_eq!(sheet.headers, vec!["name", "age"]);
        assert_eq!(sheet.data, grid(json!([["name", "age"], ["A", 10]])));
    }

    #[test]
    fn test_headers_are_trimmed() {
        let raw = grid(json!([["  id ", null, " name"], ["1", "x", "a"]]));
        let sheet = normalize_sheet(&raw, "S");

        assert_eq!(sheet.headers, vec!["id", "name"]);
        assert_eq!(sheet.data[1], vec![json!("1"), json!("a")]);
    }

    #[test]
    fn test_whitespace_header_is_blank() {
        let raw = grid(json!([["a", "   "], ["1", "2"]]));
        let sheet = normalize_sheet(&raw, "S");
        assert_eq!(sheet.headers, vec!["a"]);
        assert_eq!(sheet.data[1], vec![json!("1")]);
    }

    #[test]
    fn test_ragged_rows_padded() {
        let raw = grid(json!([["a", "b", "c"], ["1"], ["1", "2", "3", "4"]]));
        let sheet = normalize_sheet(&raw, "S");

        assert_eq!(sheet.data[1], vec![json!("1"), Value::Null, Value::Null]);
        assert_eq!(sheet.data[2], vec![json!("1"), json!("2"), json!("3")]);
    }

    #[test]
    fn test_empty_grid() {
        let sheet = normalize_sheet(&Vec::new(), "Empty");
        assert_eq!(sheet, NormalizedSheet::empty("Empty"));
    }

    #[test]
    fn test_no_surviving_headers() {
        let raw = grid(json!([["", null], ["x", "y"]]));
        let sheet = normalize_sheet(&raw, "S");
        assert!(sheet.is_empty());
        assert!(sheet.data.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let raw = grid(json!([["a", "", "b", null], ["1", "2", "3", "4"], [null, "x"]]));
        let once = normalize_sheet(&raw, "S");
        let twice = normalize_sheet(&once.data, "S");
        assert_eq!(once, twice);
    }
}
