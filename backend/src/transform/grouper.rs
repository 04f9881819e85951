//! Group retained rows by the value of one column.
//!
//! ```text
//! name  | dept                    { "X": [ {"name": "Alice"},
//! Alice | X           →                  {"name": "Cara"} ],
//! Bob   | Y                         "Y": [ {"name": "Bob"} ] }
//! Cara  | X
//! ```
//!
//! Group keys keep first-occurrence order; records keep row order inside a
//! group. The grouping column itself is left out of each record.

use serde_json::{Map, Value};

use super::shape::{effective_headers, retained_rows, row_to_object};
use crate::error::{ConvertError, ConvertResult};
use crate::models::{cell_to_string, ConversionOptions, NormalizedSheet};

/// Key used for rows whose grouping cell is null or `""`.
pub const UNGROUPED_KEY: &str = "未分组";

/// Build the grouped shape for one sheet.
pub fn group_rows(
    sheet: &NormalizedSheet,
    options: &ConversionOptions,
) -> ConvertResult<Map<String, Value>> {
    let column = options
        .group_by_column
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(ConvertError::MissingGroupColumn)?;

    if sheet.is_empty() {
        return Ok(Map::new());
    }

    let group_idx = sheet
        .column_index(column)
        .ok_or_else(|| ConvertError::GroupColumnNotFound(column.to_string()))?;

    let headers = effective_headers(sheet, options);
    let mut groups: Map<String, Value> = Map::new();

    for row in retained_rows(sheet, options) {
        let key = row
            .get(group_idx)
            .map(cell_to_string)
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| UNGROUPED_KEY.to_string());

        let record = row_to_object(row, &headers, Some(group_idx), options.use_type_conversion);

        let bucket = groups
            .entry(key)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(records) = bucket {
            records.push(Value::Object(record));
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutputShape;
    use crate::transform::normalize::normalize_sheet;
    use crate::transform::shape::retained_rows;
    use serde_json::json;

    fn staff() -> NormalizedSheet {
        normalize_sheet(
            &serde_json::from_value(json!([
                ["name", "dept"],
                ["Alice", "X"],
                ["Bob", "Y"],
                ["Cara", "X"]
            ]))
            .unwrap(),
            "Staff",
        )
    }

    fn grouped_by(column: &str) -> ConversionOptions {
        ConversionOptions {
            shape: OutputShape::Grouped,
            group_by_column: Some(column.to_string()),
            ..ConversionOptions::default()
        }
    }

    #[test]
    fn test_group_by_dept() {
        let out = group_rows(&staff(), &grouped_by("dept")).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({
                "X": [{"name": "Alice"}, {"name": "Cara"}],
                "Y": [{"name": "Bob"}]
            })
        );
    }

    #[test]
    fn test_first_occurrence_key_order() {
        let out = group_rows(&staff(), &grouped_by("dept")).unwrap();
        let keys: Vec<&String> = out.keys().collect();
        assert_eq!(keys, vec!["X", "Y"]);
    }

    #[test]
    fn test_empty_group_cell_falls_back() {
        let sheet = normalize_sheet(
            &serde_json::from_value(json!([["name", "dept"], ["Dan", ""], ["Eve", null]])).unwrap(),
            "S",
        );
        let out = group_rows(&sheet, &grouped_by("dept")).unwrap();
        assert_eq!(out[UNGROUPED_KEY].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_mapping_applies_to_record_keys() {
        let mut options = grouped_by("dept");
        options.header_mapping.insert("name".into(), "Name".into());
        options.header_mapping.insert("dept".into(), "Department".into());
        let out = group_rows(&staff(), &options).unwrap();
        assert_eq!(out["Y"], json!([{"Name": "Bob"}]));
    }

    #[test]
    fn test_missing_group_column() {
        let options = ConversionOptions {
            shape: OutputShape::Grouped,
            ..ConversionOptions::default()
        };
        assert!(matches!(
            group_rows(&staff(), &options),
            Err(ConvertError::MissingGroupColumn)
        ));
    }

    #[test]
    fn test_unknown_group_column() {
        let err = group_rows(&staff(), &grouped_by("team")).unwrap_err();
        assert!(err.to_string().contains("team"));
    }

    #[test]
    fn test_empty_sheet_is_empty_object() {
        let out = group_rows(&NormalizedSheet::empty("E"), &grouped_by("dept")).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_group_sizes_sum_to_rows() {
        let out = group_rows(&staff(), &grouped_by("dept")).unwrap();
        let total: usize = out.values().map(|v| v.as_array().unwrap().len()).sum();
        assert_eq!(total, 3);
    }

    fn mixed() -> NormalizedSheet {
        normalize_sheet(
            &serde_json::from_value(json!([
                ["name", "", "age", "dept"],
                ["A", "junk", "30", "X"],
                [null, null, null, null],
                ["B", "junk", "true", 7],
                ["C", "", " 41 ", "X"]
            ]))
            .unwrap(),
            "Mixed",
        )
    }

    fn group_total(groups: &Map<String, Value>) -> usize {
        groups.values().map(|v| v.as_array().unwrap().len()).sum()
    }

    #[test]
    fn test_typed_and_skipped_rows() {
        let options = ConversionOptions {
            use_type_conversion: true,
            skip_empty_rows: true,
            ..grouped_by("dept")
        };
        let out = group_rows(&mixed(), &options).unwrap();

        assert_eq!(
            Value::Object(out.clone()),
            json!({
                "X": [{"name": "A", "age": 30}, {"name": "C", "age": 41}],
                "7": [{"name": "B", "age": true}]
            })
        );
        assert!(!Value::Object(out.clone()).to_string().contains("junk"));
        assert_eq!(group_total(&out), retained_rows(&mixed(), &options).len());
    }

    #[test]
    fn test_start_row_and_blank_rows_kept() {
        let options = ConversionOptions {
            start_row: 2,
            ..grouped_by("dept")
        };
        let out = group_rows(&mixed(), &options).unwrap();

        // the all-null row is retained and lands in the fallback group
        assert_eq!(out[UNGROUPED_KEY], json!([{"name": null, "age": null}]));
        assert_eq!(out["X"], json!([{"name": "C", "age": " 41 "}]));
        assert_eq!(group_total(&out), retained_rows(&mixed(), &options).len());
        assert_eq!(group_total(&out), 3);
    }
}
